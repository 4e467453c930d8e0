use crate::commands::{run_favorite, run_search, run_show, FavoriteArgs, SearchArgs, ShowArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use smart_property::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "SmartProperty",
    about = "Search listings and run the SmartProperty listing service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print one page of listings matching the given filters
    Search(SearchArgs),
    /// Print a single listing, optionally with generated insights
    Show(ShowArgs),
    /// Sign in and flip a listing in your favorites
    Favorite(FavoriteArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Search(args) => run_search(args).await,
        Command::Show(args) => run_show(args).await,
        Command::Favorite(args) => run_favorite(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_flags_parse() {
        let cli = Cli::try_parse_from([
            "smart-property",
            "search",
            "--q",
            "villa",
            "--type",
            "Villa",
            "--beds",
            "3",
            "--page",
            "2",
        ])
        .expect("arguments parse");
        match cli.command {
            Some(Command::Search(args)) => {
                assert_eq!(args.q.as_deref(), Some("villa"));
                assert_eq!(args.property_type.as_deref(), Some("Villa"));
                assert_eq!(args.page, Some(2));
            }
            other => panic!("expected search command, got {other:?}"),
        }
    }

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["smart-property"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}
