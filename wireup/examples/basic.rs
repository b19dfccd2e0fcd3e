//! Basic example of the Wireup DI container.

use std::sync::Arc;
use wireup::prelude::*;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Config {
    database_url: String,
    debug: bool,
}

struct Database {
    url: String,
    logger: Arc<dyn Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    fn find_user(&self, id: u64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

struct UserService {
    repo: Arc<UserRepository>,
    logger: Arc<dyn Logger>,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.logger.log(&format!("Getting user {id}"));
        self.repo.find_user(id)
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("wireup=debug")
        .init();

    // Build the container
    let container = Container::builder()
        // Config — singleton value (already created)
        .singleton_value(Config {
            database_url: "postgres://localhost/myapp".to_string(),
            debug: true,
        })
        // Logger — singleton behind a trait contract
        .singleton_as::<dyn Logger, ConsoleLogger>(
            |logger| logger as Arc<dyn Logger>,
            |t| {
                t.constructor(vec![], |_| Ok(ConsoleLogger));
            },
        )
        // Database — singleton (depends on Config + Logger)
        .singleton::<Database>(|t| {
            t.constructor(
                vec![
                    DependencyKey::of::<Config>(),
                    DependencyKey::of::<dyn Logger>(),
                ],
                |args| {
                    let config = args.take::<Config>()?;
                    let logger = args.take_trait::<dyn Logger>()?;
                    Ok(Database {
                        url: config.database_url.clone(),
                        logger,
                    })
                },
            );
        })
        // UserRepository — scoped (one per request)
        .scoped::<UserRepository>(|t| {
            t.constructor(vec![DependencyKey::of::<Database>()], |args| {
                Ok(UserRepository {
                    db: args.take::<Database>()?,
                })
            });
        })
        // UserService — transient (new each time)
        .transient::<UserService>(|t| {
            t.constructor(
                vec![
                    DependencyKey::of::<UserRepository>(),
                    DependencyKey::of::<dyn Logger>(),
                ],
                |args| {
                    Ok(UserService {
                        repo: args.take::<UserRepository>()?,
                        logger: args.take_trait::<dyn Logger>()?,
                    })
                },
            );
        })
        .build()?;

    println!("container built: {container:?}");

    // === Resolve from the root container ===
    let config = container.resolve::<Config>()?;
    println!(
        "config: database_url={}, debug={}",
        config.database_url, config.debug
    );

    // === Create a scope (e.g., for an HTTP request) ===
    {
        let scope = container.create_scope();

        let service = scope.resolve::<UserService>()?;
        println!("{}", service.get_user(42));

        // Resolve again in the same scope — UserRepository is reused
        let service2 = scope.resolve::<UserService>()?;
        println!("{}", service2.get_user(7));
    }
    // scope dropped — its scoped instances are disposed

    container.dispose();
    Ok(())
}
