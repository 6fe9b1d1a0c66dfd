use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::FutureExt;
use tokio::sync::mpsc;
use warp::Filter;

use hireside::auth::TokenFileVerifier;
use hireside::config::get_variable;
use hireside::db::FsDb;
use hireside::environment::Environment;
use hireside::routes;
use hireside::store::FsStore;
use hireside::urls::Urls;
use log::{info, initialize_logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = get_variable("HIRESIDE_PORT")
        .parse()
        .expect("parse HIRESIDE_PORT as u16");
    let admin_port: u16 = get_variable("HIRESIDE_ADMIN_PORT")
        .parse()
        .expect("parse HIRESIDE_ADMIN_PORT as u16");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    let data_path = PathBuf::from(get_variable("HIRESIDE_DATA_PATH"));

    info!(logger, "Opening record store..."; "data_path" => data_path.display().to_string());
    let db = Arc::new(FsDb::create(data_path.clone()).expect("open record store"));

    let store =
        Arc::new(FsStore::create(data_path.join("videos")).expect("open media store"));

    let verifier = Arc::new(TokenFileVerifier::new(get_variable("HIRESIDE_TOKENS_PATH")));

    let urls = Arc::new(Urls::new(
        get_variable("HIRESIDE_BASE_URL"),
        get_variable("HIRESIDE_MEDIA_PATH"),
    ));

    let environment = Environment::new(logger.clone(), db, urls, store, verifier);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            let termination_sender = termination_sender.clone();
            termination_sender.send(()).await.unwrap();
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            let terminate = terminate.clone();

            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let logger2 = logger.clone();

        let submit_route = routes::make_submit_route(environment.clone());
        let submissions_route = routes::make_submissions_route(environment.clone());
        let media_route = routes::make_media_route(environment.clone());
        let create_interview_route = routes::make_create_interview_route(environment.clone());
        let interview_count_route = routes::make_interview_count_route(environment.clone());
        let interview_route = routes::make_interview_route(environment.clone());

        // the count route must precede the parameterized interview
        // route
        let routes = submit_route
            .or(submissions_route)
            .or(media_route)
            .or(create_interview_route)
            .or(interview_count_route)
            .or(interview_route)
            .recover(move |r| routes::format_rejection(logger2.clone(), r));

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone()).or(
            routes::admin::make_termination_route(environment.clone(), terminate),
        );

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
