use std::time::Duration;

use serde_json::Value;

use searchfed_query::Params;

use crate::error::AttemptError;

/// `GET url?params`, expecting a JSON object back within `timeout`.
pub async fn get_json(client: &reqwest::Client, url: &str, params: &Params, timeout: Duration) -> Result<Value, AttemptError> {
    let request = client.get(url).query(params.pairs()).timeout(timeout);
    send_json(request, timeout).await
}

/// Form-encoded `POST url`; used when the query is too long for a URL.
pub async fn post_form_json(client: &reqwest::Client, url: &str, params: &Params, timeout: Duration) -> Result<Value, AttemptError> {
    let request = client.post(url).form(params.pairs()).timeout(timeout);
    send_json(request, timeout).await
}

async fn send_json(request: reqwest::RequestBuilder, timeout: Duration) -> Result<Value, AttemptError> {
    let exchange = async {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|e| AttemptError::MalformedBody(e.to_string()))?;
        if !body.is_object() {
            return Err(AttemptError::MalformedBody("expected a JSON object".to_string()));
        }
        Ok(body)
    };
    match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result,
        Err(_) => Err(AttemptError::Timeout(timeout.as_millis())),
    }
}
