use searchfed_core::config::EmbeddingSettings;
use searchfed_embed::get_default_embedder;

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Force fake embedder to avoid loading the model
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let embedder = get_default_embedder(&EmbeddingSettings::default()).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string(), "goodbye".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let (v1, v2, v3) = (&embs[0], &embs[1], &embs[2]);

    assert_eq!(v1.len(), 384, "dimension follows embedding.dimension");
    assert_eq!(embedder.dim(), 384);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
    assert_ne!(v1, v3, "different text, different vector");
}

#[test]
fn configured_fake_needs_no_model_files() {
    let settings = EmbeddingSettings { use_fake: true, dimension: 16, model_dir: "/nonexistent".into(), ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&settings).expect("fake embedder");
    assert_eq!(embedder.embed("query text").unwrap().len(), 16);
}
