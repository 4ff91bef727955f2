//! The `/rolldice` handlers.

use crate::lifecycle::Telemetry;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;
use opentelemetry::KeyValue;
use opentelemetry::metrics::Counter;
use rand::Rng;

/// Instrumentation scope for the dice meter.
pub const METER_NAME: &str = "dice";

/// Shared handler state.
#[derive(Clone)]
pub struct DiceState {
    rolls: Counter<u64>,
}

impl DiceState {
    /// Creates the roll counter on the bundle's meter provider.
    pub fn new(telemetry: &Telemetry) -> Self {
        let rolls = telemetry
            .meter(METER_NAME)
            .u64_counter("dice.rolls")
            .with_description("The number of rolls by roll value")
            .with_unit("{roll}")
            .build();
        Self { rolls }
    }

    fn roll(&self, player: Option<&str>) -> String {
        let span = tracing::info_span!("roll", roll.value = tracing::field::Empty);
        let _entered = span.enter();

        let value: i64 = rand::rng().random_range(1..=6);
        span.record("roll.value", value);

        match player {
            Some(player) => tracing::info!(result = value, "{player} is rolling the dice"),
            None => tracing::info!(result = value, "Anonymous player is rolling the dice"),
        }

        self.rolls.add(1, &[KeyValue::new("roll.value", value)]);

        format!("{value}\n")
    }
}

/// Routes for `GET /rolldice/` and `GET /rolldice/{player}`.
pub fn routes(state: DiceState) -> Router {
    Router::new()
        .route("/rolldice/", get(roll_anonymous))
        .route("/rolldice/{player}", get(roll_for_player))
        .with_state(state)
}

async fn roll_anonymous(State(state): State<DiceState>) -> String {
    state.roll(None)
}

async fn roll_for_player(State(state): State<DiceState>, Path(player): Path<String>) -> String {
    state.roll(Some(&player))
}
