use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tower_sessions::ExpiredDeletion;
use tracing::{error, info, warn};

use fileshare::config::MailConfig;
use fileshare::db::{ServerConfig, ServerConfigRepository};
use fileshare::{
    ensure_admin, validate_password, AppState, Config, Database, FileStorage, FileshareError,
    Result, SmtpMailer, UserRepository, WebServer, WebSettings,
};

const CONFIG_PATH: &str = "config.toml";

/// How often expired sessions are swept from the store.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    // Load configuration
    let config = if Path::new(CONFIG_PATH).exists() {
        match Config::load_with_env(CONFIG_PATH) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {CONFIG_PATH}: {e}");
                std::process::exit(1);
            }
        }
    } else {
        eprintln!("{CONFIG_PATH} not found. Using default configuration.");
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = fileshare::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        fileshare::logging::init_console_only(&config.logging.level);
    }

    info!("fileshare {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config).await {
        error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    let db = Database::open(&config.database.path).await?;

    let sessions = db.session_store();
    sessions
        .delete_expired()
        .await
        .map_err(|e| FileshareError::Database(e.to_string()))?;

    seed_mail_config(&db, &config.mail).await?;
    setup_admin(&db, &config).await?;

    let storage = FileStorage::new(&config.files.storage_path)?;
    info!("File storage at {}", config.files.storage_path);

    let state = AppState::new(
        db.clone(),
        storage,
        Arc::new(SmtpMailer::new(db)),
        WebSettings::from_config(&config),
    );

    let server = WebServer::new(&config, state)?;

    let sweeper = tokio::spawn(async move {
        if let Err(e) = sessions
            .continuously_delete_expired(SESSION_SWEEP_INTERVAL)
            .await
        {
            error!("Session cleanup stopped: {}", e);
        }
    });

    let result = server.run().await;
    sweeper.abort();
    result
}

/// Write the `[mail]` section to the database the first time it is set.
async fn seed_mail_config(db: &Database, mail: &MailConfig) -> Result<()> {
    let repo = ServerConfigRepository::new(db.pool());
    if repo.exists().await? {
        return Ok(());
    }
    if mail.server.is_empty() {
        warn!("No mail server configured; notifications will fail until [mail] is set");
        return Ok(());
    }

    let from_address = if mail.from_address.is_empty() {
        mail.username.clone()
    } else {
        mail.from_address.clone()
    };
    repo.set(&ServerConfig {
        mail_server: mail.server.clone(),
        mail_port: i64::from(mail.port),
        mail_username: mail.username.clone(),
        mail_password: mail.password.clone(),
        from_address,
        attach_files: mail.attach_files,
    })
    .await?;
    info!("Mail settings stored for {}", mail.server);
    Ok(())
}

/// Create the first administrator, prompting for a password if needed.
async fn setup_admin(db: &Database, config: &Config) -> Result<()> {
    let repo = UserRepository::new(db.pool());
    if repo.count_by_role(fileshare::Role::Admin).await? > 0 {
        return Ok(());
    }

    let password = if config.admin.password.is_empty() {
        prompt_password(&config.admin.email)?
    } else {
        config.admin.password.clone()
    };

    if let Some(admin) = ensure_admin(&repo, &config.admin.name, &config.admin.email, &password).await? {
        info!("Created administrator {}", admin.email);
    }
    Ok(())
}

fn prompt_password(email: &str) -> Result<String> {
    let stdin = io::stdin();
    loop {
        print!("Password for the initial administrator ({email}): ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Err(FileshareError::Config(
                "no administrator password given; set [admin] password or FILESHARE_ADMIN_PASSWORD"
                    .to_string(),
            ));
        }

        let password = line.trim_end_matches(['\r', '\n']).to_string();
        match validate_password(&password) {
            Ok(()) => return Ok(password),
            Err(e) => eprintln!("{e}"),
        }
    }
}
