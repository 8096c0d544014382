use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tracing::info;
use wheel_reconciler::OutcomeReconciler;
use wheel_shared::{Chance, PrizeCase};

mod config;
mod logging;
mod session;
mod spin_api;

use config::SimConfig;
use session::{ScriptStep, SpinSession, UserAction};
use spin_api::{ScriptedReply, ScriptedSpinApi};

fn chance(chance_id: &str, label: &str, weight: f64, is_losing: bool) -> Chance {
    Chance {
        chance_id: chance_id.to_string(),
        label: label.to_string(),
        weight,
        is_losing,
    }
}

fn demo_cases() -> Vec<PrizeCase> {
    vec![
        PrizeCase {
            id: "bronze".to_string(),
            name: "Bronze case".to_string(),
            chances: vec![
                chance("bronze-10", "10 stars", 50.0, false),
                chance("bronze-50", "50 stars", 30.0, false),
                chance("bronze-none", "Nothing", 20.0, true),
            ],
        },
        PrizeCase {
            id: "silver".to_string(),
            name: "Silver case".to_string(),
            chances: vec![
                chance("silver-25", "25 stars", 45.0, false),
                chance("silver-100", "100 stars", 15.0, false),
                chance("silver-gift", "Gift", 5.0, false),
                chance("silver-none", "Nothing", 35.0, true),
            ],
        },
    ]
}

fn demo_script() -> Vec<ScriptStep> {
    vec![
        // Plain spin.
        ScriptStep::new(0, UserAction::Spin),
        // Double click while the first request is still out.
        ScriptStep::new(100, UserAction::Spin),
        // Spin, then switch cases before the answer arrives.
        ScriptStep::new(8_000, UserAction::Spin),
        ScriptStep::new(100, UserAction::SwitchCase("silver".to_string())),
        ScriptStep::new(1_000, UserAction::Spin),
        // A request that never answers.
        ScriptStep::new(8_000, UserAction::Spin),
    ]
}

fn demo_api(config: &SimConfig) -> ScriptedSpinApi {
    let api = ScriptedSpinApi::new(config.api_latency);
    api.push_json(json!({"spin_id": "spin-1", "status": "pending", "prize": {"chance_id": "bronze-50", "amount": 50}}))
        .push_json(json!({"spin_id": "spin-2", "status": "lose"}))
        .push_json(json!({"spin_id": "spin-3", "status": "pending", "prize": {"chance_id": "silver-gift"}}))
        .push(ScriptedReply::Hang);
    api
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::setup()?;

    let config = SimConfig::from_env()?;
    info!("Starting wheel simulation with {:?}", config);

    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let reconciler = OutcomeReconciler::with_rng(config.reconciler.clone(), rng)?;
    let api = demo_api(&config);
    let session = SpinSession::new(reconciler, api.clone(), demo_cases(), "bronze", config.frame_interval)?;

    let summary = session.run(demo_script()).await;
    info!(
        "Simulation finished: landed on {:?} (ticker {:?}, {} losses), {} refused, {} discarded, {} timed out, {} api errors, {} replies unused",
        summary.landed,
        summary.ticker,
        summary.losses,
        summary.refused,
        summary.discarded,
        summary.timed_out,
        summary.api_errors,
        api.remaining()
    );
    Ok(())
}
