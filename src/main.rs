use std::sync::{Arc, Mutex};

use clap::{Arg, ArgAction, Command};
use locrelay::mt::{MockBackend, MockMode, MtError, QueryStore, RelayConfig, Translator};

const MOCK_RELAY_URL: &str = "https://relay.invalid/exec";

fn load_config(path: Option<&String>, use_mock: bool) -> Result<RelayConfig, MtError> {
    let mut config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| MtError::ConfigError(format!("Cannot read {}: {}", path, e)))?;
            RelayConfig::from_json_str(&json)?
        }
        None => RelayConfig::from_env()?,
    };
    if use_mock && config.relay_url.is_empty() {
        config.relay_url = MOCK_RELAY_URL.to_string();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("locrelay")
        .version("0.1.0")
        .about("Translate a localization string through a web relay")
        .arg(
            Arg::new("message")
                .help("Source text, e.g. \"Hello [b]{[name]}[/b]\"")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("targets")
                .help("Comma-separated target language codes (e.g., fr,de,ru)")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("source-locale")
                .long("source")
                .short('s')
                .help("Source language code (default: auto-detect)")
                .default_value("auto"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("JSON configuration file (default: LOCRELAY_* environment variables)"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Answer requests in-process instead of calling the relay")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .short('f')
                .help("Block until done instead of polling on a timer")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show queries and transport progress")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let message = matches.get_one::<String>("message").unwrap();
    let targets: Vec<&str> = matches
        .get_one::<String>("targets")
        .unwrap()
        .split(',')
        .map(str::trim)
        .filter(|target| !target.is_empty())
        .collect();
    let source = matches.get_one::<String>("source-locale").unwrap();
    let use_mock = matches.get_flag("mock");
    let force = matches.get_flag("force");
    let verbose = matches.get_flag("verbose");

    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    let config = load_config(matches.get_one::<String>("config"), use_mock)?;
    let mut translator = if use_mock {
        Translator::new(config, Arc::new(MockBackend::new(MockMode::Suffix)))?
    } else {
        Translator::from_config(config)?
    };

    if let Err(e) = translator.can_translate() {
        eprintln!("❌ {}", e);
        eprintln!("   Set LOCRELAY_URL, pass --config, or use --mock");
        return Err(e.into());
    }

    // Targets answered without the service are printed as-is
    let mut store = QueryStore::new();
    let mut immediate = Vec::new();
    for target in &targets {
        match translator.immediate_result(message, source, target) {
            Some(result) => immediate.push((*target, result)),
            None => {
                translator.create_queries(message, source, target, &mut store);
            }
        }
    }

    if verbose {
        println!("📝 Source: \"{}\" ({})", message, source);
        println!("📦 {} distinct queries", store.len());
        for query in store.iter() {
            println!("   \"{}\" → {}", query.original_text, query.target_languages.join(","));
        }
        println!();
    }

    let store = if store.is_empty() {
        store
    } else if force {
        translator.force_translate(store)?
    } else {
        let outcome: Arc<Mutex<Option<(QueryStore, Option<MtError>)>>> = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&outcome);
        translator.translate_batch(store, move |store, error| {
            if let Ok(mut slot) = sink.lock() {
                *slot = Some((store, error));
            }
        });

        let mut interval = tokio::time::interval(translator.config().tick_interval());
        while translator.is_translating() {
            interval.tick().await;
            translator.tick();
        }

        let delivered = outcome.lock().ok().and_then(|mut slot| slot.take());
        match delivered {
            Some((store, None)) => store,
            Some((_, Some(e))) => {
                eprintln!("❌ Translation failed: {}", e);
                return Err(e.into());
            }
            None => return Err("Translation job ended without a result".into()),
        }
    };

    for (target, result) in immediate {
        println!("{}: {}", target, result);
    }
    for target in targets {
        if translator.immediate_result(message, source, target).is_none() {
            println!("{}: {}", target, translator.rebuild(message, &store, target));
        }
    }

    Ok(())
}
