use anyhow::Result;
use clap::Parser;
use photoshelf::commands::{self, Config, ProfileChanges};
use std::path::PathBuf;

/// photoshelf - personal photo storage from the command line
///
/// Sign in, then upload, browse, edit and delete your photos. `photoshelf demo`
/// signs in to the shared demo account, whose photos stay on this machine.
///
/// Examples:
///   photoshelf login --email you@example.com
///   photoshelf upload beach.jpg --title "Beach day"
///   photoshelf list
#[derive(Parser, Debug)]
#[command(author, version = env!("PHOTOSHELF_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Photo service URL (defaults to the address compiled in at build time)
    #[arg(
        long = "api-url",
        env = "PHOTOSHELF_API_URL",
        value_name = "URL",
        global = true
    )]
    pub api_url: Option<String>,

    /// Directory holding the session and demo data (also via PHOTOSHELF_HOME)
    #[arg(
        long = "state-dir",
        env = "PHOTOSHELF_HOME",
        value_name = "PATH",
        global = true
    )]
    pub state_dir: Option<PathBuf>,

    /// Log debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Sign in with email and password
    Login(LoginArgs),

    /// Sign in to the demo account
    Demo,

    /// Create an account
    Signup(SignupArgs),

    /// Sign out and forget the session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List your photos, newest first
    #[command(alias = "ls")]
    List,

    /// Upload a photo
    Upload(UploadArgs),

    /// Change the title or description of a photo
    Edit(EditArgs),

    /// Delete a photo
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Update your name, avatar or banner
    Profile(ProfileArgs),

    /// Send feedback to the developers
    Feedback(FeedbackArgs),
}

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// Account email (prompted for when omitted)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Account password (prompted for when omitted)
    #[arg(long, env = "PHOTOSHELF_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SignupArgs {
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Password; when omitted it is prompted for twice
    #[arg(long, env = "PHOTOSHELF_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    /// Image file (JPEG, PNG, GIF or WEBP, at most 10 MB)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[arg(long, short = 't')]
    pub title: Option<String>,

    #[arg(long, short = 'd')]
    pub desc: Option<String>,

    /// Don't draw upload progress
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    #[arg(value_name = "PHOTO_ID")]
    pub id: String,

    #[arg(long, short = 't')]
    pub title: Option<String>,

    #[arg(long, short = 'd')]
    pub desc: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    #[arg(value_name = "PHOTO_ID")]
    pub id: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,

    /// New banner image
    #[arg(long, value_name = "FILE", conflicts_with = "remove_banner")]
    pub banner: Option<PathBuf>,

    /// New avatar image
    #[arg(long, value_name = "FILE", conflicts_with = "remove_avatar")]
    pub avatar: Option<PathBuf>,

    /// Go back to the default banner
    #[arg(long)]
    pub remove_banner: bool,

    /// Go back to the default avatar
    #[arg(long)]
    pub remove_avatar: bool,
}

#[derive(clap::Args, Debug)]
pub struct FeedbackArgs {
    /// The message to send
    #[arg(value_name = "MESSAGE")]
    pub message: String,

    /// Defaults to the signed-in user's name
    #[arg(long)]
    pub name: Option<String>,

    /// Defaults to the signed-in user's email
    #[arg(long)]
    pub email: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let runtime = photoshelf::runtime::RealRuntime;
    let config = Config::new(runtime, cli.state_dir, cli.api_url)?;

    match cli.command {
        Commands::Login(args) => commands::login(&config, args.email, args.password).await?,
        Commands::Demo => commands::demo(&config).await?,
        Commands::Signup(args) => {
            commands::signup(&config, args.name, args.email, args.password).await?
        }
        Commands::Logout => commands::logout(&config)?,
        Commands::Whoami => commands::whoami(&config)?,
        Commands::List => commands::list(&config).await?,
        Commands::Upload(args) => {
            commands::upload(&config, &args.file, args.title, args.desc, args.quiet).await?
        }
        Commands::Edit(args) => commands::edit(&config, &args.id, args.title, args.desc).await?,
        Commands::Delete(args) => commands::delete(&config, &args.id, args.yes).await?,
        Commands::Profile(args) => {
            let changes = ProfileChanges {
                name: args.name,
                banner: args.banner,
                avatar: args.avatar,
                remove_banner: args.remove_banner,
                remove_avatar: args.remove_avatar,
            };
            commands::profile(&config, changes).await?
        }
        Commands::Feedback(args) => {
            commands::feedback(&config, args.name, args.email, args.message).await?
        }
    }
    Ok(())
}
