use crate::CLAP_STYLING;
use clap::{arg, command};
use docsweep_core::config::DEFAULT_CONFIG_PATH;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("docsweep")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("docsweep")
        .about("Discovers and harvests documentation from cloud vendor help portals")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .global(true)
                .help("Path to the configuration file")
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .arg(
            arg!(-q --"quiet" "Suppress progress output and informational logging")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Enable debug logging")
                .required(false)
                .global(true)
                .conflicts_with("quiet"),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("init")
                .about("Writes the bundled default configuration to the config path")
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite an existing configuration file without asking")
                        .required(false),
                ),
        )
        .subcommand(command!("vendors").about("Lists configured vendors"))
        .subcommand(
            command!("products")
                .about("Lists the products configured for a vendor")
                .arg(
                    arg!(--"vendor" <VENDOR>)
                        .required(true)
                        .help("Vendor key, e.g. aliyun"),
                ),
        )
        .subcommand(
            command!("links")
                .about(
                    "Expands each product's navigation sidebar in a browser and writes a link \
                manifest per product",
                )
                .arg(
                    arg!(--"vendor" <VENDOR>)
                        .required(true)
                        .help("Vendor key, e.g. aliyun"),
                )
                .arg(
                    arg!(-p --"product" <PRODUCT>)
                        .required(false)
                        .help("Only harvest this product (default: every configured product)"),
                )
                .arg(
                    arg!(--"json")
                        .required(false)
                        .help("Print the run summary as JSON")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("content")
                .about("Extracts documents listed in the newest link manifest of each product")
                .arg(
                    arg!(--"vendor" <VENDOR>)
                        .required(false)
                        .help("Vendor key, e.g. aliyun (default: every configured vendor)"),
                )
                .arg(
                    arg!(-p --"product" <PRODUCT>)
                        .required(false)
                        .requires("vendor")
                        .help("Only extract this product (default: every product with a manifest)"),
                )
                .arg(
                    arg!(--"json")
                        .required(false)
                        .help("Print the run summary as JSON")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("fetch")
                .about("Extracts a single document URL without navigation discovery")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("Document URL to fetch"),
                )
                .arg(
                    arg!(--"vendor" <VENDOR>)
                        .required(true)
                        .help("Vendor key used to pick the content extractor"),
                ),
        )
}
