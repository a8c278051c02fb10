mod bot;
mod components;
mod config;
mod db;
mod discord;
mod event;
mod log;

#[cfg(test)]
mod tests;

trait ResultLog {
    type OkType;
    fn expect_log(self, msg: &str) -> Self::OkType;
}
impl<T, S: AsRef<str>> ResultLog for Result<T, S> {
    type OkType=T;
    fn expect_log(self, msg: &str) -> T {
        match self {
            Ok(v) => v,
            Err(e) if msg.is_empty() => {
                log_error!("{}", e.as_ref());
                panic!("{}", e.as_ref())
            }
            Err(e) => {
                log_error!("{}: {}", msg, e.as_ref());
                panic!("{}: {}", msg, e.as_ref())
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let config = config::Config::read_file("./config.json").expect_log("Could not load the configuration file");
    log::init(config.log_level.as_deref()).map_err(|e| e.to_string()).expect_log("Could not install the logger");
    let mut bot = bot::Bot::new(&config).await.map_err(|e| e.to_string()).expect_log("");
    bot.start().await.map_err(|e| e.to_string()).expect_log("Client won't start");
}
