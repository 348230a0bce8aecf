//! Demonstration of the Synheart Wear Agent activation flow.
//!
//! This example shows how to:
//! 1. Build the agent on a simulated wearable
//! 2. Activate it with undetermined consent
//! 3. Watch groups come up as consent prompts are answered
//! 4. Receive readings from a started group
//! 5. Terminate and print the transparency summary
//!
//! Run with: cargo run --example activation_demo

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use synheart_wear_agent::{
    simulated::{DeviceProfile, PromptMode, SimulatedDevice, SimulatedPrivacy},
    transparency::create_shared_log,
    Config, ConsentOutcome, GroupId, PrivacyScope, SensorAgent, SensorType, PRIVACY_DECLARATION,
};

fn main() {
    println!("Synheart Wear Agent - Activation Demo");
    println!("=====================================");
    println!();
    println!("{PRIVACY_DECLARATION}");
    println!();

    // A watch without a barometer whose user allows vital sensors only
    let profile = DeviceProfile::default()
        .without_sensor(SensorType::Pressure)
        .with_prompt_answer(PrivacyScope::Storage, ConsentOutcome::DeniedOnce)
        .with_prompt_delay_ms(300);

    let device = Arc::new(SimulatedDevice::new(profile.clone()));
    let privacy = Arc::new(SimulatedPrivacy::new(&profile, PromptMode::from_profile(&profile)));
    let transparency_log = create_shared_log();

    let agent = match SensorAgent::new(
        device.clone(),
        privacy,
        &Config::default(),
        transparency_log.clone(),
    ) {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    println!("Activating...");
    println!("  {}", agent.on_activated());
    println!();

    println!("Waiting for the consent prompts to be answered...");
    thread::sleep(Duration::from_millis(600));
    println!("  {}", agent.usability());
    println!();

    let vital = agent.readings(GroupId::Vital);
    let _pump = SimulatedDevice::spawn_pump(device, Duration::from_millis(200));
    println!("Reading vital sensors for 1 second:");
    thread::sleep(Duration::from_secs(1));
    for reading in vital.try_iter() {
        println!(
            "  [{}] {}: {:?}",
            reading.timestamp.format("%H:%M:%S%.3f"),
            reading.sensor,
            reading.values
        );
    }
    println!();

    println!("Re-activating (declined scope is not asked again)...");
    println!("  {}", agent.on_activated());
    println!();

    agent.on_terminate();
    println!("{}", transparency_log.summary());
}
