use colored::Colorize;
use commands::command_argument_builder;
use docsweep::handlers::{
    expand_path, handle_content, handle_fetch, handle_init, handle_links, handle_products,
    handle_vendors, init_tracing, load_config, print_banner,
};
use docsweep_core::config::DEFAULT_CONFIG_PATH;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");

    init_tracing(verbose, quiet);

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let config_path = expand_path(
        chosen_command
            .get_one::<String>("config")
            .map(String::as_str)
            .unwrap_or(DEFAULT_CONFIG_PATH),
    );

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => {
            handle_init(&config_path, primary_command.get_flag("force"))
        }
        Some((name, primary_command)) => match load_config(&config_path) {
            Ok(config) => match name {
                "vendors" => handle_vendors(&config),
                "products" => handle_products(&config, primary_command),
                "links" => handle_links(&config, primary_command, quiet).await,
                "content" => handle_content(&config, primary_command, quiet).await,
                "fetch" => handle_fetch(&config, primary_command).await,
                _ => unreachable!("clap should ensure we don't get here"),
            },
            Err(e) => Err(e),
        },
        None => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
