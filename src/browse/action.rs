//! Line commands understood by the browser.

/// User intents emitted by the browser's input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseAction {
    /// Submit a new search term
    Search(String),
    /// Next page of the current term
    Next,
    /// Previous page of the current term
    Previous,
    /// Jump to a page (clamped to the known range)
    Page(u32),
    /// Re-run the stored search from page 1
    First,
    /// Open the detail view for an article id
    Show(String),
    /// Close the detail view
    Close,
    /// Drop the session and the stored snapshot
    Reset,
    /// Print the current view again
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  search <term>   start a new search
  next | prev     move one page
  page <n>        jump to page n
  first           first page of the last stored search
  show <id>       article details
  close           close the details
  status          show the current page again
  reset           forget the current search
  quit";

/// Parse one input line. Blank search terms are rejected here, before they
/// ever reach the session.
pub fn parse_action(line: &str) -> Result<BrowseAction, String> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command.to_lowercase().as_str() {
        "search" | "s" => {
            if rest.is_empty() {
                Err("Enter a search term".to_string())
            } else {
                Ok(BrowseAction::Search(rest.to_string()))
            }
        }
        "next" | "n" => Ok(BrowseAction::Next),
        "prev" | "previous" | "p" => Ok(BrowseAction::Previous),
        "page" => rest
            .parse::<u32>()
            .map(BrowseAction::Page)
            .map_err(|_| format!("Not a page number: '{}'", rest)),
        "first" | "home" => Ok(BrowseAction::First),
        "show" | "open" => {
            if rest.is_empty() {
                Err("Which article? Use `show <id>`".to_string())
            } else {
                Ok(BrowseAction::Show(rest.to_string()))
            }
        }
        "close" => Ok(BrowseAction::Close),
        "reset" => Ok(BrowseAction::Reset),
        "status" | "" => Ok(BrowseAction::Status),
        "help" | "?" => Ok(BrowseAction::Help),
        "quit" | "exit" | "q" => Ok(BrowseAction::Quit),
        other => Err(format!("Unknown command '{}'. Type `help`.", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_keeps_whole_term() {
        assert_eq!(
            parse_action("search  breast cancer BRCA1 "),
            Ok(BrowseAction::Search("breast cancer BRCA1".into()))
        );
    }

    #[test]
    fn test_blank_search_rejected() {
        assert!(parse_action("search").is_err());
        assert!(parse_action("search    ").is_err());
    }

    #[test]
    fn test_paging_commands() {
        assert_eq!(parse_action("next"), Ok(BrowseAction::Next));
        assert_eq!(parse_action("prev"), Ok(BrowseAction::Previous));
        assert_eq!(parse_action("page 0"), Ok(BrowseAction::Page(0)));
        assert_eq!(parse_action("PAGE 12"), Ok(BrowseAction::Page(12)));
        assert!(parse_action("page two").is_err());
        assert_eq!(parse_action("first"), Ok(BrowseAction::First));
    }

    #[test]
    fn test_misc_commands() {
        assert_eq!(parse_action("show 31452104"), Ok(BrowseAction::Show("31452104".into())));
        assert!(parse_action("show").is_err());
        assert_eq!(parse_action(""), Ok(BrowseAction::Status));
        assert_eq!(parse_action("q"), Ok(BrowseAction::Quit));
        assert!(parse_action("frobnicate").is_err());
    }
}
