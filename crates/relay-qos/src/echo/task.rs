use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::selector::CandidateSelector;
use crate::crypto::KeyPair;
use crate::directory::GatekeeperClient;
use crate::error::EchoError;
use crate::model::TestProposal;

/// Node state the echo task depends on
#[derive(Clone)]
pub struct EchoContext {
    /// Running without any peer clouds
    pub standalone: bool,
    /// Transport security enabled; relay tests require authenticated channels
    pub secure_mode: bool,
    pub keypair: Option<Arc<KeyPair>>,
}

/// What a single tick did
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// Previous tick still running
    AlreadyRunning,
    Standalone,
    InsecureMode,
    NoCandidate,
    Submitted(TestProposal),
    /// Proposal built but the gatekeeper could not be reached; retried next tick
    SubmissionFailed { proposal: TestProposal, reason: String },
}

/// Scheduled entry point of relay echo testing
pub struct RelayEchoTask {
    selector: CandidateSelector,
    gatekeeper: Arc<dyn GatekeeperClient>,
    context: EchoContext,
    running: Mutex<()>,
}

impl RelayEchoTask {
    pub fn new(selector: CandidateSelector, gatekeeper: Arc<dyn GatekeeperClient>, context: EchoContext) -> Self {
        Self { selector, gatekeeper, context, running: Mutex::new(()) }
    }

    /// Run one tick to completion
    ///
    /// A tick that overlaps a running one returns immediately.
    pub async fn run(&self) -> Result<TickOutcome, EchoError> {
        let Ok(_guard) = self.running.try_lock() else {
            debug!("Relay echo task skipped: previous run still in progress");
            return Ok(TickOutcome::AlreadyRunning);
        };

        debug!("STARTED: relay echo task");

        if self.context.standalone {
            debug!("Finished: relay echo task can not run if server is in standalone mode");
            return Ok(TickOutcome::Standalone);
        }

        if !self.context.secure_mode {
            debug!("Finished: relay echo task can not run if server is not in secure mode");
            return Ok(TickOutcome::InsecureMode);
        }

        let keypair = self.context.keypair.as_ref().ok_or(EchoError::MissingPublicKey)?;

        let selection = self.selector.select().await?;
        let Some(pair) = selection.pair else {
            debug!("Finished: have no cloud-relay pair to run relay echo test");
            return Ok(TickOutcome::NoCandidate);
        };

        let proposal = TestProposal::signed(
            selection.own_cloud.descriptor(),
            pair.cloud.descriptor(),
            pair.relay,
            keypair,
        )
        .map_err(EchoError::Signing)?;

        match self.gatekeeper.submit_test_proposal(&proposal).await {
            Ok(()) => {
                info!("Relay echo test proposed to {} via {}", pair.cloud.id(), proposal.relay);
                Ok(TickOutcome::Submitted(proposal))
            }
            Err(e) => {
                warn!("Relay test proposal to {} could not be delivered: {:#}", pair.cloud.id(), e);
                Ok(TickOutcome::SubmissionFailed { proposal, reason: format!("{e:#}") })
            }
        }
    }

    /// Start the periodic task; errors end the tick, never the schedule
    pub fn start_periodic(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                timer.tick().await;

                match self.run().await {
                    Ok(outcome) => debug!("Relay echo tick finished: {:?}", outcome),
                    Err(e @ EchoError::MissingOwnCloud) => error!("Relay echo tick failed: {}", e),
                    Err(e) => warn!("Relay echo tick failed: {:#}", anyhow::Error::from(e)),
                }
            }
        })
    }
}
