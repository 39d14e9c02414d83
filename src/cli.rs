//! Command-line parsing for the terminal front end.

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Restore the session and print who is signed in.
    Status,
    Login { remember_me: bool },
    Signup,
    Logout,
    ResetPassword,
    /// Run the profile wizard and submit it.
    Onboard { email: Option<String> },
    /// Fetch the stored profile.
    Profile { email: Option<String> },
    Help,
    Unknown(String),
}

pub struct CommandParser;

impl CommandParser {
    /// Parse process arguments (without the program name).
    pub fn parse<I, S>(args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let Some(first) = args.first() else {
            return Command::Status;
        };
        let rest = &args[1..];
        let email = rest.iter().find(|a| !a.starts_with("--")).cloned();

        match first.to_lowercase().as_str() {
            "status" => Command::Status,
            "login" => Command::Login {
                remember_me: rest.iter().any(|a| a == "--remember" || a == "-r"),
            },
            "signup" | "register" => Command::Signup,
            "logout" => Command::Logout,
            "reset-password" | "reset" => Command::ResetPassword,
            "onboard" => Command::Onboard { email },
            "profile" => Command::Profile { email },
            "help" | "--help" | "-h" => Command::Help,
            other => Command::Unknown(other.to_string()),
        }
    }
}

pub const USAGE: &str = "\
Usage: dietplan <command>

Commands:
  status                 Show the restored session
  login [--remember]     Sign in
  signup                 Create an account
  logout                 Sign out
  reset-password         Reset a forgotten password
  onboard [email]        Build your profile and generate a diet plan
  profile [email]        Show the stored profile
  help                   Show this message";
