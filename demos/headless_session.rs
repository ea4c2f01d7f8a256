use adcolony_bridge::sdk::backends::scripted::ScriptedSdk;
use adcolony_bridge::sdk::{Reward, ZoneInfo};
use adcolony_bridge::{AdBridge, BridgeConfig, BridgeError, HostEvent, SerialExecutor, ZoneId};
use serde_json::json;
use std::sync::Arc;
use tokio::runtime::Handle;

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    env_logger::init();

    // The bridge needs two execution contexts: one where SDK calls are made (the platform's
    // UI thread in a real host), and one where events are handed to the host runtime.
    let rt = Handle::current();
    let ui = Arc::new(SerialExecutor::new("ui", &rt));
    let host = Arc::new(SerialExecutor::new("host", &rt));

    // The scripted SDK lets us play the ad network side by hand. We tell it that the
    // "rewarded" zone hands out 25 coins per view.
    let sdk = Arc::new(ScriptedSdk::new());
    sdk.set_zone_info(ZoneInfo::rewarded(ZoneId::from("vz-rewarded"), "coins", 25));

    let config = BridgeConfig::builder()
        .plugin_name("plugin.adcolony")
        .build()
        .expect("BridgeConfig is not valid");
    let bridge = AdBridge::new(config, sdk.clone(), ui.clone(), host.clone());

    // Every event ends up here, on the host context, one at a time.
    let listener = Arc::new(|ev: &HostEvent| {
        let data = ev.data().map(|d| d.to_string()).unwrap_or_default();
        println!(
            "{:<10} type={:<14} error={:<5} {}",
            ev.phase().unwrap_or("?"),
            ev.ad_type().unwrap_or("-"),
            ev.is_error(),
            data
        );
    });

    bridge.init(
        listener,
        &json!({
            "appId": "app-demo",
            "adZones": { "interstitial": "vz-inter", "rewarded": "vz-rewarded" },
            "adOrientation": "portrait",
            "privacyConsents": { "GDPR": true },
        }),
    )?;

    // Nothing can be loaded until the SDK has been configured on the UI context.
    if let Err(e) = bridge.load("rewarded", None) {
        println!("too early: {e}");
    }
    settle(&ui, &host).await;

    bridge.get_info_for_zone("rewarded")?;
    bridge.load("rewarded", Some(&json!({ "prePopup": true })))?;
    bridge.load("interstitial", None)?;
    settle(&ui, &host).await;

    // The network answers: the rewarded zone fills, the interstitial zone does not.
    sdk.fill(&ZoneId::from("vz-rewarded"));
    sdk.no_fill(&ZoneId::from("vz-inter"));
    settle(&ui, &host).await;

    println!("rewarded loaded: {}", bridge.is_loaded("rewarded")?);
    bridge.show("rewarded")?;
    settle(&ui, &host).await;

    sdk.close(&ZoneId::from("vz-rewarded"));
    sdk.reward(Reward {
        zone_id: ZoneId::from("vz-rewarded"),
        name: "coins".into(),
        amount: 25,
        success: true,
    });
    settle(&ui, &host).await;

    // Showing again without a new load is refused
    if let Err(e) = bridge.show("rewarded") {
        println!("second show: {e}");
    }

    bridge.teardown();
    settle(&ui, &host).await;
    println!("ready after teardown: {}", bridge.is_ready());

    Ok(())
}

async fn settle(ui: &SerialExecutor, host: &SerialExecutor) {
    ui.flush().await;
    host.flush().await;
}
