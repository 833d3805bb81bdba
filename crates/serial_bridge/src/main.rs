use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use retroline::{Bridge, SerialPort};
use serial_bridge::config::BridgeEnvConfig;
use serial_bridge::{logger, responders};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

fn main() -> io::Result<()> {
    logger::init_from_env();

    let config = BridgeEnvConfig::from_env().map_err(io::Error::other)?;
    let responder = responders::responder_for_config(&config).map_err(io::Error::other)?;

    let stop = Arc::new(AtomicBool::new(false));
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    {
        let stop = Arc::clone(&stop);
        thread::Builder::new()
            .name("signal-listener".to_string())
            .spawn(move || {
                if signals.forever().next().is_some() {
                    log::info!("interrupt received, stopping after the current poll");
                    stop.store(true, Ordering::SeqCst);
                }
            })?;
    }

    log::info!(
        "opening {} at {} baud ({} responder)",
        config.serial_port,
        config.baud_rate,
        config.responder_id
    );
    let channel =
        SerialPort::open(&config.serial_port, config.baud_rate).map_err(io::Error::other)?;

    let mut bridge = Bridge::new(
        channel,
        responder,
        config.system_prompt.clone(),
        config.bridge_config(),
    );
    bridge.run(&stop).map_err(io::Error::other)
}
