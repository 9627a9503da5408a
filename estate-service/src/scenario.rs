use crate::devnet::Devnet;
use estate_core::domain::RecordVersion;
use estate_core::foundation::{EstateError, PartyId};
use log::info;
use serde::Serialize;

pub const FULL_SCENARIO_STEPS: usize = 4;
pub const SCENARIO_AREA: i64 = 100;
pub const SCENARIO_ADDRESS: &str = "X";

#[derive(Clone, Debug, Serialize)]
pub struct ScenarioStep {
    pub step: &'static str,
    pub initiator: PartyId,
    pub version: RecordVersion,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScenarioReport {
    pub steps: Vec<ScenarioStep>,
    /// Why selling the final version to nobody was refused; only set when all steps ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_sale_rejection: Option<String>,
}

/// Create by A, sell to B, B rents to C, B cancels C's tenancy, then B tries to sell to nobody.
///
/// `steps` caps how many of the four transitions run.
pub async fn run_end_to_end(devnet: &Devnet, steps: usize) -> Result<ScenarioReport, EstateError> {
    let parties = devnet.parties();
    let [a, b, c] = match parties.as_slice() {
        [a, b, c, ..] => [a.clone(), b.clone(), c.clone()],
        _ => return Err(EstateError::ConfigError(format!("scenario needs three parties, devnet has {}", parties.len()))),
    };
    let steps = steps.min(FULL_SCENARIO_STEPS);
    let mut report = ScenarioReport { steps: Vec::with_capacity(steps), empty_sale_rejection: None };
    if steps == 0 {
        return Ok(report);
    }

    let created = devnet.node(&a)?.create(vec![a.clone()], Vec::new(), SCENARIO_AREA, SCENARIO_ADDRESS).await?;
    let record_id = created.record_id();
    report.steps.push(ScenarioStep { step: "create", initiator: a.clone(), version: created });

    if steps >= 2 {
        let sold = devnet.node(&a)?.sell(record_id, vec![b.clone()]).await?;
        report.steps.push(ScenarioStep { step: "sell", initiator: a.clone(), version: sold });
    }
    if steps >= 3 {
        let rented = devnet.node(&b)?.rent(record_id, vec![c.clone()]).await?;
        report.steps.push(ScenarioStep { step: "rent", initiator: b.clone(), version: rented });
    }
    if steps >= 4 {
        let cancelled = devnet.node(&b)?.cancel_rent(record_id, vec![c.clone()]).await?;
        report.steps.push(ScenarioStep { step: "cancel_rent", initiator: b.clone(), version: cancelled });

        match devnet.node(&b)?.sell(record_id, Vec::new()).await {
            Err(err @ EstateError::ValidationFailed(_)) => report.empty_sale_rejection = Some(err.to_string()),
            Err(err) => return Err(err),
            Ok(version) => {
                return Err(EstateError::UnexpectedOutcome {
                    operation: "sell to nobody".to_string(),
                    details: format!("accepted as sequence {}", version.sequence),
                });
            }
        }
    }
    info!("scenario finished record_id={} steps={}", record_id, report.steps.len());
    Ok(report)
}
