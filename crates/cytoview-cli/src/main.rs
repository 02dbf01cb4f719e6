// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use cytoview_app::{AppState, ViewKind};
use runtime::ApiRuntime;
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `cytoview --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let base_url = match &options.api_url {
        Some(url) => url.clone(),
        None => config.base_url()?,
    };
    let client = cytoview_api::Client::new(&base_url, config.timeout()?).with_context(|| {
        format!(
            "invalid [server] config in {}; fix base_url/timeout or pass --api-url",
            options.config_path.display()
        )
    })?;

    if options.check_only {
        let samples = client.list_samples()?;
        println!("ok: {} samples at {}", samples.len(), client.base_url());
        return Ok(());
    }

    let log_dir = config.log_dir()?;
    let _log_guard = logging::init_logging(config.log_level(), &log_dir)?;
    tracing::info!(base_url = client.base_url(), log_dir = %log_dir.display(), "cytoview starting");

    let mut state = AppState {
        view: match options.view {
            Some(view) => view,
            None => config.start_view()?,
        },
        page_size: config.page_size(),
        ..AppState::default()
    };

    let mut runtime = ApiRuntime::new(client);
    cytoview_tui::run_app(&mut state, &mut runtime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    api_url: Option<String>,
    view: Option<ViewKind>,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        api_url: None,
        view: None,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--api-url" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--api-url requires a URL"))?;
                options.api_url = Some(value.as_ref().to_owned());
            }
            "--view" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--view requires a view name"))?;
                options.view = Some(config::parse_view(value.as_ref())?);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("cytoview: cytometry sample browser");
    println!("  --config <path>          Use a specific config path");
    println!("  --api-url <url>          Override [server].base_url");
    println!("  --view <name>            Start on samples, freqs, analysis, baseline or filter");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and reach the service once");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use cytoview_app::ViewKind;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/cytoview-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                api_url: None,
                view: None,
                print_config_path: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_overrides() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--config",
                "/custom/config.toml",
                "--api-url",
                "http://lab:8000/api",
                "--view",
                "analysis",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(options.api_url.as_deref(), Some("http://lab:8000/api"));
        assert_eq!(options.view, Some(ViewKind::Analysis));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        for (flag, expected) in [
            ("--config", "--config requires a file path"),
            ("--api-url", "--api-url requires a URL"),
            ("--view", "--view requires a view name"),
        ] {
            let error = parse_cli_args(vec![flag], default_options_path())
                .expect_err("missing value should fail");
            assert!(error.to_string().contains(expected), "{error}");
        }
    }

    #[test]
    fn parse_cli_args_rejects_unknown_view() {
        let error = parse_cli_args(vec!["--view", "dashboard"], default_options_path())
            .expect_err("unknown view should fail");
        assert!(error.to_string().contains("unknown view"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}
