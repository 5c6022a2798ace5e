use super::load_existing_config as load_existing_config_impl;
use super::parse_model_chain;

#[test]
fn load_existing_config() {
    let config = load_existing_config_impl().expect("config loaded successfully");
    assert!(!config.server.host.is_empty());
    assert!(config.server.port > 0);
    assert!(!config.scoring.models.is_empty());
    assert!(!config.storage.context_file.as_os_str().is_empty());
}

#[test]
fn model_chain_parsing() {
    assert_eq!(
        parse_model_chain("allenai/specter2, all-mpnet-base-v2"),
        vec!["allenai/specter2".to_string(), "all-mpnet-base-v2".to_string()]
    );
    assert_eq!(
        parse_model_chain(" one ,, two , "),
        vec!["one".to_string(), "two".to_string()]
    );
    assert!(parse_model_chain("  ,  ").is_empty());
    assert!(parse_model_chain("").is_empty());
}
