use clap::Parser;
use keystash::cli::commands::add::AddArgs;
use keystash::cli::{Cli, Commands};
use keystash::errors::KeystashError;
use keystash::store::KeyDetailsUpdate;
use tracing_subscriber::EnvFilter;

/// Env var controlling log verbosity (`tracing_subscriber` filter syntax).
const LOG_ENV_VAR: &str = "KEYSTASH_LOG";

fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        report(&e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays clean for `get` and `export`.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> keystash::errors::Result<()> {
    use keystash::cli::commands;

    // `keygen` needs neither settings nor keys.
    if let Commands::Keygen { hex } = cli.command {
        return commands::keygen::execute(hex);
    }

    let settings = keystash::cli::load_settings()?;

    match cli.command {
        Commands::Keygen { .. } => Ok(()),
        Commands::Init => commands::init::execute(cli, &settings),
        Commands::Project { ref action } => commands::project::execute(cli, &settings, action),
        Commands::Add {
            ref project,
            ref name,
            ref service,
            env,
            ref notes,
            reminder,
            ref value,
        } => commands::add::execute(
            cli,
            &settings,
            AddArgs {
                project,
                name,
                service,
                environment: env,
                notes: notes.as_deref(),
                reminder,
                value: value.as_deref(),
            },
        ),
        Commands::List {
            ref project,
            masked,
        } => commands::list::execute(cli, &settings, project.as_deref(), masked),
        Commands::Get { ref id, copy } => commands::get::execute(cli, &settings, id, copy),
        Commands::Find { ref value } => commands::find::execute(cli, &settings, value.as_deref()),
        Commands::Update { ref id, ref value } => {
            commands::update::execute(cli, &settings, id, value.as_deref())
        }
        Commands::Edit {
            ref id,
            ref name,
            ref service,
            env,
            ref notes,
            reminder,
        } => commands::edit::execute(
            cli,
            &settings,
            id,
            KeyDetailsUpdate {
                name: name.clone(),
                service: service.clone(),
                environment: env,
                notes: notes.clone(),
                rotation_reminder: reminder,
            },
        ),
        Commands::Delete { ref id, force } => commands::delete::execute(cli, &settings, id, force),
        Commands::Export {
            ref project,
            ref format,
            ref output,
        } => commands::export::execute(cli, &settings, project, format, output.as_deref()),
        Commands::Reminders { days } => commands::reminders::execute(cli, &settings, days),
        Commands::Reencrypt => commands::reencrypt::execute(cli, &settings),
        Commands::Versions => commands::versions::execute(cli, &settings),
    }
}

/// Print an error.  Codec failures collapse into one generic message so
/// nothing about keys, nonces, or tags reaches the terminal.
fn report(e: &KeystashError) {
    if e.is_codec_failure() {
        keystash::cli::output::error("Unable to retrieve key");
        if matches!(e, KeystashError::KeyNotFound(_)) {
            keystash::cli::output::tip(
                "Run `keystash versions` to check which key versions are configured.",
            );
        }
        return;
    }

    keystash::cli::output::error(&e.to_string());
    if let KeystashError::MissingConfig(var) = e {
        keystash::cli::output::tip(&format!(
            "Generate a key with `keystash keygen` and export it as {var}."
        ));
    }
}
