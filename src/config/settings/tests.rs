use super::*;
use serial_test::serial;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.embedding_model, "nomic-embed-text:latest");
    assert_eq!(config.ollama.batch_size, 16);
    assert!(config.index.extract_triplets);
    assert!(!config.index.include_embeddings);
    assert_eq!(config.index.empty_chunk_policy, EmptyChunkPolicy::Keep);
    assert_eq!(
        config.index.extraction_failure_policy,
        ExtractionFailurePolicy::Abort
    );
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.llm_model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.batch_size = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.index.max_triplets_per_chunk = 0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidMaxTriplets(0))
    ));

    let mut invalid_config = config.clone();
    invalid_config.index.extraction_concurrency = 65;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.chunking.chunk_overlap = invalid_config.chunking.chunk_size;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::OverlapTooLarge(..))
    ));
}

#[test]
fn ollama_config_validation() {
    let valid = OllamaConfig {
        protocol: "https".to_string(),
        host: "example.com".to_string(),
        port: 8080,
        batch_size: 128,
        ..OllamaConfig::default()
    };
    assert!(valid.validate().is_ok());

    let invalid = [
        OllamaConfig {
            protocol: "ftp".to_string(),
            ..OllamaConfig::default()
        },
        OllamaConfig {
            port: 0,
            ..OllamaConfig::default()
        },
        OllamaConfig {
            embedding_model: String::new(),
            ..OllamaConfig::default()
        },
        OllamaConfig {
            llm_model: "   ".to_string(),
            ..OllamaConfig::default()
        },
        OllamaConfig {
            batch_size: 0,
            ..OllamaConfig::default()
        },
        OllamaConfig {
            batch_size: 1001,
            ..OllamaConfig::default()
        },
    ];
    for config in invalid {
        assert!(config.validate().is_err(), "{:?} should be rejected", config);
    }
}

#[test]
fn https_url_generation() {
    let mut config = Config::default();
    config.ollama.protocol = "https".to_string();
    config.ollama.host = "secure.example.com".to_string();
    config.ollama.port = 443;

    let url = config
        .ollama_url()
        .expect("should generate https url successfully");
    assert_eq!(url.as_str(), "https://secure.example.com/");
}

#[test]
fn load_missing_config_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("should load default config");

    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.index, IndexConfig::default());
    assert_eq!(config.get_base_dir(), temp_dir.path());
    assert_eq!(config.docstore_path(), temp_dir.path().join("docstore.db"));
    assert_eq!(config.index_path(), temp_dir.path().join("index.json"));
}

#[test]
fn save_and_reload() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base_dir = temp_dir.path().join("nested");

    let mut config = Config {
        base_dir: base_dir.clone(),
        ..Config::default()
    };
    config.index.include_embeddings = true;
    config.index.empty_chunk_policy = EmptyChunkPolicy::Skip;
    config.index.extraction_failure_policy = ExtractionFailurePolicy::SkipChunk;
    config.index.stopwords = vec!["the".to_string(), "a".to_string()];

    config.save().expect("should save config");
    assert!(base_dir.join("config.toml").exists());

    let loaded = Config::load(&base_dir).expect("should reload config");
    assert_eq!(config, loaded);
}

#[test]
fn partial_toml_fills_defaults() {
    let toml_str = r#"
        [ollama]
        host = "gpu-box"

        [index]
        include_embeddings = true
        empty_chunk_policy = "skip"
    "#;

    let config: Config = toml::from_str(toml_str).expect("should parse partial toml");

    assert_eq!(config.ollama.host, "gpu-box");
    assert_eq!(config.ollama.port, 11434);
    assert!(config.index.include_embeddings);
    assert!(config.index.extract_triplets);
    assert_eq!(config.index.empty_chunk_policy, EmptyChunkPolicy::Skip);
    assert_eq!(config.chunking, ChunkingConfig::default());
}

#[test]
fn invalid_config_file_fails_to_load() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[index]\nmax_triplets_per_chunk = 0\n",
    )
    .expect("should write config file");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
#[serial]
fn config_dir_env_override() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    // SAFETY: tests touching the environment are serialized
    unsafe { std::env::set_var(BASE_DIR_ENV, temp_dir.path()) };
    let dir = Config::config_dir();
    unsafe { std::env::remove_var(BASE_DIR_ENV) };

    assert_eq!(dir.expect("should resolve config dir"), temp_dir.path());
}

#[test]
#[serial]
fn config_dir_defaults_to_home() {
    // SAFETY: tests touching the environment are serialized
    unsafe { std::env::remove_var(BASE_DIR_ENV) };

    if let Some(home) = dirs::home_dir() {
        let dir = Config::config_dir().expect("should resolve config dir");
        assert_eq!(dir, home.join(".kg-index"));
    }
}
