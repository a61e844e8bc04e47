//! Headless replay host: applies a JSON action script to a JSON session.

#[cfg(not(target_arch = "wasm32"))]
mod replay {
    use std::path::{Path, PathBuf};

    use region_annotator::{ConfigError, Editor, EditorConfig, RegionError, Session};
    use serde_json::Value;
    use web_time::Instant;

    const USAGE: &str = "usage: annotate-replay <session.json> <actions.json> [--config <config.json>] [--save-config <path>]";

    #[derive(Debug, thiserror::Error)]
    pub enum ReplayError {
        #[error("{0}")]
        Usage(String),

        #[error("Failed to read {path:?}: {source}")]
        Io {
            path: PathBuf,
            source: std::io::Error,
        },

        #[error("Invalid session: {0}")]
        Session(#[from] RegionError),

        #[error("Invalid configuration: {0}")]
        Config(#[from] ConfigError),

        #[error("Invalid action script: {0}")]
        Script(String),

        #[error("Failed to serialize state: {0}")]
        Output(#[from] serde_json::Error),
    }

    /// Parsed command line.
    pub struct Args {
        pub session: PathBuf,
        pub actions: PathBuf,
        pub config: Option<PathBuf>,
        /// Where to write the configuration the replay ran with
        pub save_config: Option<PathBuf>,
    }

    impl Args {
        pub fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ReplayError> {
            let mut positional = Vec::new();
            let mut config = None;
            let mut save_config = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    flag @ ("--config" | "--save-config") => {
                        let path = args
                            .next()
                            .map(PathBuf::from)
                            .ok_or_else(|| ReplayError::Usage(format!("{} needs a path", flag)))?;
                        if flag == "--config" {
                            config = Some(path);
                        } else {
                            save_config = Some(path);
                        }
                    }
                    "-h" | "--help" => return Err(ReplayError::Usage(USAGE.to_string())),
                    _ => positional.push(PathBuf::from(arg)),
                }
            }

            let [session, actions] = <[PathBuf; 2]>::try_from(positional)
                .map_err(|_| ReplayError::Usage(USAGE.to_string()))?;
            Ok(Self {
                session,
                actions,
                config,
                save_config,
            })
        }
    }

    fn read(path: &Path) -> Result<String, ReplayError> {
        std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `--config` first, then the session's inline config, then the user config file.
    fn resolve_config(args: &Args, session: &mut Session) -> Result<EditorConfig, ReplayError> {
        if let Some(path) = &args.config {
            return Ok(EditorConfig::load_from_path(path)?);
        }
        if let Some(config) = session.config.take() {
            return Ok(config);
        }
        Ok(EditorConfig::load_from_default_path().unwrap_or_default())
    }

    fn init_logging(config: &EditorConfig) {
        let mut builder = env_logger::Builder::new();
        if std::env::var_os("RUST_LOG").is_some() {
            builder.parse_default_env();
        } else {
            builder.filter_level(config.log_level.to_level_filter());
        }
        // A logger may already be installed when embedded; keep that one
        let _ = builder.try_init();
    }

    pub fn run(args: Args) -> Result<(), ReplayError> {
        let mut session = Session::from_json(&read(&args.session)?)?;
        let config = resolve_config(&args, &mut session)?;
        init_logging(&config);

        let script: Value = serde_json::from_str(&read(&args.actions)?)
            .map_err(|e| ReplayError::Script(e.to_string()))?;
        let Value::Array(actions) = script else {
            return Err(ReplayError::Script("expected a JSON array of actions".to_string()));
        };

        let mut editor = Editor::from_session(session, config)?;
        if let Some(path) = &args.save_config {
            editor.state().config.save_to_path(path)?;
        }
        let start = Instant::now();
        let mut rejected = 0;
        for (i, action) in actions.iter().enumerate() {
            if let Err(e) = editor.dispatch_json(action) {
                rejected += 1;
                log::warn!("Action #{} rejected: {}", i, e);
            }
        }
        log::info!(
            "⏱️ Replayed {} actions ({} rejected) in {:.2?}",
            actions.len(),
            rejected,
            start.elapsed()
        );

        println!("{}", editor.state().to_json()?);
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn args(list: &[&str]) -> Result<Args, ReplayError> {
            Args::parse(list.iter().map(|s| s.to_string()))
        }

        #[test]
        fn test_parse_args() {
            let parsed = args(&["s.json", "--save-config", "out.json", "a.json"]).expect("valid");
            assert_eq!(parsed.session, PathBuf::from("s.json"));
            assert_eq!(parsed.actions, PathBuf::from("a.json"));
            assert_eq!(parsed.config, None);
            assert_eq!(parsed.save_config, Some(PathBuf::from("out.json")));

            assert!(matches!(args(&["s.json"]), Err(ReplayError::Usage(_))));
            assert!(matches!(args(&["s.json", "a.json", "--config"]), Err(ReplayError::Usage(_))));
        }

        #[test]
        fn test_inline_config_used_without_flag() {
            let mut session = Session::new(Vec::new());
            session.config = Some(EditorConfig::new().read_only(true));
            let parsed = args(&["s.json", "a.json"]).expect("valid");
            let config = resolve_config(&parsed, &mut session).expect("config");
            assert!(config.read_only);
            assert!(session.config.is_none());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    let result = replay::Args::parse(std::env::args().skip(1)).and_then(replay::run);
    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("annotate-replay: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

// The replay host reads files; there is nothing to run on the web
#[cfg(target_arch = "wasm32")]
fn main() {}
