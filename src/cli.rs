use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the model and knowledge base, then serve the HTTP API.
    Serve {
        /// Address to listen on (overrides server.listen)
        #[clap(short, long)]
        listen: Option<String>,
    },

    /// Answer a single question and print the result as JSON.
    Ask {
        /// The question to answer
        #[clap(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Don't append the exchange to the chat history
        #[clap(long, default_value = "false")]
        no_history: bool,
    },

    /// Print recent chat history as JSON.
    History {
        /// Number of records to show (defaults to history.recent_limit)
        #[clap(short, long)]
        limit: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_joins_words() {
        let args = Args::parse_from(["qabot", "ask", "How", "should", "I", "prioritize?"]);
        match args.command {
            Command::Ask {
                question,
                no_history,
            } => {
                assert_eq!(question.join(" "), "How should I prioritize?");
                assert!(!no_history);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Args::try_parse_from(["qabot", "ask"]).is_err());
    }

    #[test]
    fn test_serve_listen_override() {
        let args = Args::parse_from(["qabot", "serve", "--listen", "127.0.0.1:8080"]);
        assert!(matches!(
            args.command,
            Command::Serve { listen: Some(ref l) } if l == "127.0.0.1:8080"
        ));
    }

    #[test]
    fn test_history_limit() {
        let args = Args::parse_from(["qabot", "history", "-l", "3"]);
        assert!(matches!(args.command, Command::History { limit: Some(3) }));
    }
}
