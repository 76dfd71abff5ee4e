//! Tests for the redrive-cli library module.

use super::*;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).expect("arguments should parse")
}

mod parsing {
    use super::*;

    #[test]
    fn test_demo_flags() {
        let cli = parse(&["redrive", "demo", "--purge"]);

        match cli.command {
            Commands::Demo { purge, keep_queues } => {
                assert!(purge);
                assert!(!keep_queues);
            }
            other => panic!("Expected Demo command, got: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&[
            "redrive",
            "arn",
            "orders",
            "--provider",
            "sqs",
            "--log-level",
            "debug",
            "--json-logs",
        ]);

        assert_eq!(cli.provider, Some(ProviderChoice::Sqs));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(cli.json_logs);
    }

    #[test]
    fn test_create_with_dead_letter() {
        let cli = parse(&[
            "redrive",
            "create",
            "orders",
            "--dead-letter",
            "orders-dlq",
            "--max-receive-count",
            "5",
        ]);

        match cli.command {
            Commands::Create {
                name,
                fifo,
                dead_letter,
                max_receive_count,
                ..
            } => {
                assert_eq!(name.as_str(), "orders");
                assert!(!fifo);
                assert_eq!(dead_letter.map(|n| n.to_string()), Some("orders-dlq".to_string()));
                assert_eq!(max_receive_count, 5);
            }
            other => panic!("Expected Create command, got: {:?}", other),
        }
    }

    #[test]
    fn test_max_receive_count_defaults_to_three() {
        let cli = parse(&["redrive", "create", "orders", "--dead-letter", "orders-dlq"]);

        match cli.command {
            Commands::Create {
                max_receive_count, ..
            } => assert_eq!(max_receive_count, 3),
            other => panic!("Expected Create command, got: {:?}", other),
        }
    }

    #[test]
    fn test_send_collects_repeated_attributes() {
        let cli = parse(&[
            "redrive",
            "send",
            "orders",
            "hello",
            "--attribute",
            "Author=Example Author",
            "-a",
            "Empty=",
        ]);

        match cli.command {
            Commands::Send {
                body, attributes, ..
            } => {
                assert_eq!(body, "hello");
                assert_eq!(
                    attributes,
                    vec![
                        ("Author".to_string(), "Example Author".to_string()),
                        ("Empty".to_string(), String::new()),
                    ]
                );
            }
            other => panic!("Expected Send command, got: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_arguments_are_rejected() {
        let cases: &[&[&str]] = &[
            &["redrive", "send", "orders", "hello", "--attribute", "no-equals"],
            &["redrive", "send", "orders", "hello", "--attribute", "=value"],
            &["redrive", "arn", "bad name!"],
            &["redrive", "delete"],
            &["redrive", "extend", "orders", "receipt", "soon"],
            &["redrive", "arn", "orders", "--provider", "azure"],
        ];

        for args in cases {
            assert!(
                Cli::try_parse_from(*args).is_err(),
                "{:?} should be rejected",
                args
            );
        }
    }

    #[test]
    fn test_delete_takes_several_queues() {
        let cli = parse(&["redrive", "delete", "orders", "orders-dlq"]);

        match cli.command {
            Commands::Delete { queues } => assert_eq!(queues.len(), 2),
            other => panic!("Expected Delete command, got: {:?}", other),
        }
    }
}

mod errors {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            CliError::Configuration(ConfigError::Logging {
                message: "x".to_string(),
            }),
            CliError::Queue(QueueError::QueueNotFound {
                queue_name: "orders".to_string(),
            }),
            CliError::CommandFailed {
                message: "x".to_string(),
            },
            CliError::InvalidArgument {
                arg: "x".to_string(),
                message: "x".to_string(),
            },
            CliError::Io(std::io::Error::other("x")),
            CliError::Serialization {
                message: "x".to_string(),
            },
        ];

        let codes: HashSet<i32> = errors.iter().map(CliError::exit_code).collect();

        assert_eq!(codes.len(), errors.len());
        assert!(!codes.contains(&0));
    }

    #[test]
    fn test_provider_choice_maps_to_provider_type() {
        assert_eq!(ProviderType::from(ProviderChoice::Memory), ProviderType::InMemory);
        assert_eq!(ProviderType::from(ProviderChoice::Sqs), ProviderType::AwsSqs);
    }
}

mod running {
    use super::*;

    #[tokio::test]
    async fn test_config_command_prints_resolved_configuration() {
        let config = RedriveConfig::default();
        let mut out = Vec::new();

        run(
            Commands::Config {
                format: ConfigFormat::Json,
            },
            &config,
            &mut out,
        )
        .await
        .unwrap();

        let printed: RedriveConfig = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed, config);
    }

    #[tokio::test]
    async fn test_config_command_renders_every_format() {
        let config = RedriveConfig::default();

        for format in [ConfigFormat::Yaml, ConfigFormat::Json, ConfigFormat::Toml] {
            let mut out = Vec::new();
            run(Commands::Config { format }, &config, &mut out)
                .await
                .unwrap();

            let text = String::from_utf8(out).unwrap();
            assert!(text.contains("in_memory"), "{:?}: {}", format, text);
        }
    }

    #[tokio::test]
    async fn test_completions_are_generated() {
        let mut out = Vec::new();

        run(
            Commands::Completions {
                shell: clap_complete::Shell::Bash,
            },
            &RedriveConfig::default(),
            &mut out,
        )
        .await
        .unwrap();

        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("redrive"));
    }

    #[tokio::test]
    async fn test_queue_commands_run_against_configured_backend() {
        let mut out = Vec::new();

        let result = run(
            Commands::Arn {
                queue: "orders".parse().unwrap(),
            },
            &RedriveConfig::default(),
            &mut out,
        )
        .await;

        // A fresh in-memory backend has no queues
        assert!(matches!(
            result,
            Err(CliError::Queue(QueueError::QueueNotFound { .. }))
        ));
    }
}
