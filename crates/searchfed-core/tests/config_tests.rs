use std::fs;
use tempfile::TempDir;

use searchfed_core::config::Config;
use searchfed_core::error::Error;
use searchfed_core::request::SearchRequest;

#[test]
fn config_file_overrides_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[cluster]\nnodes = [\"http://solr-a:8983/solr/web\"]\n\n[search]\ndefault_rows = 25\nfacet_fields = [\"domain\", \"lang\"]\n",
    )
    .unwrap();

    let settings = Config::load_from(tmp.path()).expect("load").settings().expect("settings");
    assert_eq!(settings.cluster.nodes, vec!["http://solr-a:8983/solr/web"]);
    assert_eq!(settings.search.default_rows, 25);
    assert_eq!(settings.search.facet_fields, vec!["domain", "lang"]);
    assert_eq!(settings.search.body_max_chars, 300, "unset keys keep defaults");
}

#[test]
fn invalid_file_is_a_config_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[search]\nbody_max_chars = 0\n").unwrap();

    let err = Config::load_from(tmp.path()).err().expect("zero body length rejected");
    let core = err.downcast_ref::<Error>().expect("core error");
    assert_eq!(core.kind(), "invalid_config");
}

#[test]
fn configured_rows_feed_request_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[search]\ndefault_rows = 7\nsuggest_limit = 3\n").unwrap();
    let settings = Config::load_from(tmp.path()).unwrap().settings().unwrap();

    let req = SearchRequest::from_json(&serde_json::json!({"query": "solar"}), &settings.search).unwrap();
    let SearchRequest::Simple(q) = req else { panic!("expected simple search") };
    assert_eq!(q.rows, 7);

    let req = SearchRequest::from_json(&serde_json::json!({"autocomplete": true, "query": "so"}), &settings.search).unwrap();
    let SearchRequest::Autocomplete(q) = req else { panic!("expected autocomplete") };
    assert_eq!(q.limit, 3);
}
