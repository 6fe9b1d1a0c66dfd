use std::error::Error;

use dotenv::dotenv;
use log::{debug, info, initialize_logger};
use structopt::StructOpt;

use hireside::auth::TokenFileVerifier;
use hireside::config::get_variable;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "generate-tokens",
    about = "Generate and print access tokens for the given user IDs"
)]
struct Opt {
    /// The user IDs to generate tokens for
    user_ids: Vec<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let opt = Opt::from_args();

    let logger = initialize_logger();

    let verifier = TokenFileVerifier::new(get_variable("HIRESIDE_TOKENS_PATH"));

    let user_ids = opt.user_ids;

    info!(logger, "Generating tokens for {:?}...", &user_ids);

    let mut tokens = vec![];

    for user_id in &user_ids {
        let logger = logger.new(log::o!("user_id" => user_id.clone()));
        info!(logger, "Generating token for user {}...", user_id);

        let token = verifier.register(user_id).expect("register token");
        debug!(logger, "Generated token: {}", token);
        tokens.push(format!("{}\t{}", user_id, token));
    }

    info!(logger, "Generated tokens:\n{}", tokens.join("\n"));

    Ok(())
}
