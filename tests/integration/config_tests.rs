use dupsweep::actions::KeepStrategy;
use dupsweep::config::Config;
use dupsweep::scanner::HashAlgorithm;
use figment::providers::{Format, Serialized, Toml};
use figment::{Figment, Jail};
use std::path::Path;

#[test]
fn test_config_load_defaults() {
    // Figment without Env, so other tests' variables cannot leak in
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_load_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
algorithm = "sha512"
io_threads = 8
follow_symlinks = true
keep_strategy = "longest_name"
use_trash = false
"#,
        )?;

        let config = Config::load_from_path(Path::new("config.toml"))?;
        assert_eq!(config.algorithm, HashAlgorithm::Sha512);
        assert_eq!(config.io_threads, 8);
        assert!(config.follow_symlinks);
        assert_eq!(config.keep_strategy, KeepStrategy::LongestName);
        assert!(!config.use_trash);
        assert!(!config.skip_hidden);
        Ok(())
    });
}

#[test]
fn test_env_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "io_threads = 8\nalgorithm = \"md5\"\n")?;
        jail.set_env("DUPSWEEP_IO_THREADS", "16");
        jail.set_env("DUPSWEEP_KEEP_STRATEGY", "shortest_name");

        let config = Config::load_from_path(Path::new("config.toml"))?;
        assert_eq!(config.io_threads, 16);
        assert_eq!(config.algorithm, HashAlgorithm::Md5);
        assert_eq!(config.keep_strategy, KeepStrategy::ShortestName);
        Ok(())
    });
}

#[test]
fn test_missing_file_uses_defaults() {
    Jail::expect_with(|_jail| {
        let config = Config::load_from_path(Path::new("does-not-exist.toml"))?;
        assert_eq!(config, Config::default());
        Ok(())
    });
}

#[test]
fn test_invalid_values_are_errors() {
    Jail::expect_with(|jail| {
        jail.create_file("broken.toml", "io_threads = [not toml")?;
        assert!(Config::load_from_path(Path::new("broken.toml")).is_err());

        jail.create_file("wrong_type.toml", "io_threads = \"many\"\n")?;
        assert!(Config::load_from_path(Path::new("wrong_type.toml")).is_err());

        jail.create_file(
            "bad_algorithm.toml",
            "algorithm = \"sha265\"\nuse_trash = false\n",
        )?;
        let err = Config::load_from_path(Path::new("bad_algorithm.toml")).unwrap_err();
        assert!(err.to_string().contains("sha265"));

        jail.create_file("bad_strategy.toml", "keep_strategy = \"shortest\"\n")?;
        assert!(Config::load_from_path(Path::new("bad_strategy.toml")).is_err());
        Ok(())
    });
}

#[test]
fn test_invalid_env_value_is_error() {
    Jail::expect_with(|jail| {
        jail.set_env("DUPSWEEP_ALGORITHM", "blake9");
        assert!(Config::load_from_path(Path::new("none.toml")).is_err());
        Ok(())
    });
}

#[test]
fn test_unknown_keys_are_ignored() {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::string("io_threads = 2\ntheme = \"dark\"\n"))
        .extract()
        .unwrap();
    assert_eq!(config.io_threads, 2);
}

#[test]
fn test_toml_round_trip() {
    let config = Config {
        algorithm: HashAlgorithm::Sha1,
        skip_empty: true,
        keep_strategy: KeepStrategy::Last,
        ..Config::default()
    };
    let text = config.to_toml().unwrap();
    let parsed: Config = Figment::from(Toml::string(&text)).extract().unwrap();
    assert_eq!(parsed, config);
}
