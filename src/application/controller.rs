use crate::config::CheckoutConfig;
use crate::domain::flow::{CheckoutFlow, FlowSnapshot, FlowState, FormField};
use crate::domain::ports::{PaymentConfig, PaymentOutcome, SharedPaymentGateway};
use crate::domain::quote::MinorUnits;
use crate::error::{CheckoutError, Result};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{info, warn};

const COMMAND_BUFFER: usize = 32;

type Reply<T> = oneshot::Sender<Result<T>>;

enum Command {
    UpdateField(FormField, Reply<()>),
    RequestQuote(Reply<MinorUnits>),
    ConfirmPayment(Reply<PaymentConfig>),
    Snapshot(oneshot::Sender<FlowSnapshot>),
}

/// Completions from work the actor started on other tasks.
enum Event {
    QuoteReady,
    PaymentResolved {
        reference: String,
        outcome: PaymentOutcome,
    },
}

/// Handle to a checkout session running on its own task.
///
/// Commands are applied one at a time. While a quote is being prepared or a
/// payment is outstanding, conflicting commands are rejected rather than
/// queued behind it. Cloning the handle shares the same session.
#[derive(Clone)]
pub struct CheckoutController {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<FlowState>,
}

impl CheckoutController {
    /// Starts a fresh session. Must be called from within a Tokio runtime.
    pub fn spawn(config: CheckoutConfig, gateway: SharedPaymentGateway) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(FlowState::Collecting);

        let actor = CheckoutActor {
            flow: CheckoutFlow::new(&config),
            quote_delay: config.quote_delay,
            gateway,
            events: events_tx,
            state: state_tx,
            pending_quote: None,
        };
        tokio::spawn(actor.run(commands_rx, events_rx));

        Self {
            commands: commands_tx,
            state: state_rx,
        }
    }

    pub async fn update_field(&self, field: FormField) -> Result<()> {
        self.call(|reply| Command::UpdateField(field, reply))
            .await?
    }

    /// Resolves once the quote is ready, after the processing delay.
    ///
    /// Fails with [`CheckoutError::Busy`] if another quote is still being prepared.
    pub async fn request_quote(&self) -> Result<MinorUnits> {
        self.call(Command::RequestQuote).await?
    }

    /// Hands the quote to the payment gateway and returns without waiting for the result.
    pub async fn confirm_payment(&self) -> Result<PaymentConfig> {
        self.call(Command::ConfirmPayment).await?
    }

    pub async fn snapshot(&self) -> Result<FlowSnapshot> {
        self.call(Command::Snapshot).await
    }

    /// Waits until the payment outcome has been applied.
    ///
    /// There is no timeout: if the gateway never reports back this waits forever.
    pub async fn wait_for_terminal(&self) -> Result<FlowSnapshot> {
        let mut state = self.state.clone();
        state
            .wait_for(FlowState::is_terminal)
            .await
            .map_err(|_| CheckoutError::ControllerClosed)?;
        self.snapshot().await
    }

    async fn call<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .await
            .map_err(|_| CheckoutError::ControllerClosed)?;
        reply_rx.await.map_err(|_| CheckoutError::ControllerClosed)
    }
}

struct CheckoutActor {
    flow: CheckoutFlow,
    quote_delay: Duration,
    gateway: SharedPaymentGateway,
    events: mpsc::UnboundedSender<Event>,
    state: watch::Sender<FlowState>,
    pending_quote: Option<Reply<MinorUnits>>,
}

impl CheckoutActor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::UnboundedReceiver<Event>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = events.recv() => self.handle_event(event),
            }
            self.publish_state();
        }
        info!("Checkout session closed");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::UpdateField(field, reply) => {
                let _ = reply.send(self.flow.update_field(field));
            }
            Command::RequestQuote(reply) => self.start_quote(reply),
            Command::ConfirmPayment(reply) => {
                let result = self.flow.confirm_payment();
                match &result {
                    Ok(config) => self.start_payment(config.clone()),
                    Err(e) => warn!(error = %e, "Payment confirmation rejected"),
                }
                let _ = reply.send(result);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.flow.snapshot());
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::QuoteReady => {
                let result = self
                    .flow
                    .finish_quote()
                    .map(|()| self.flow.quote().map(|quote| quote.total).unwrap_or_default());
                if let Some(reply) = self.pending_quote.take() {
                    let _ = reply.send(result);
                }
            }
            Event::PaymentResolved { reference, outcome } => {
                let expected = matches!(
                    self.flow.state(),
                    FlowState::PaymentPending { reference: pending } if *pending == reference
                );
                if !expected {
                    warn!(%reference, "Ignoring payment result for an attempt that is not pending");
                    return;
                }
                if let Err(e) = self.flow.resolve_payment(outcome) {
                    warn!(error = %e, "Payment result rejected");
                }
            }
        }
    }

    fn start_quote(&mut self, reply: Reply<MinorUnits>) {
        if let Err(e) = self.flow.begin_quote() {
            warn!(error = %e, "Quote request rejected");
            let _ = reply.send(Err(e));
            return;
        }
        self.pending_quote = Some(reply);

        let events = self.events.clone();
        let delay = self.quote_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::QuoteReady);
        });
    }

    fn start_payment(&self, config: PaymentConfig) {
        let events = self.events.clone();
        let gateway = self.gateway.clone();
        tokio::spawn(async move {
            let reference = config.reference.clone();
            let outcome = match gateway.initiate(config).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, %reference, "Payment gateway failed, treating as cancelled");
                    PaymentOutcome::Cancelled
                }
            };
            let _ = events.send(Event::PaymentResolved { reference, outcome });
        });
    }

    fn publish_state(&self) {
        self.state.send_if_modified(|state| {
            if state == self.flow.state() {
                false
            } else {
                *state = self.flow.state().clone();
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::flow::{Notice, PAYMENT_CANCELLED_MESSAGE};
    use crate::domain::tier::ServiceTier;
    use crate::infrastructure::simulated::{SimulatedBehaviour, SimulatedGateway};
    use std::sync::Arc;

    fn config(delay_ms: u64) -> CheckoutConfig {
        CheckoutConfig {
            quote_delay: Duration::from_millis(delay_ms),
            public_key: "pk_test_local".to_string(),
            ..Default::default()
        }
    }

    async fn with_email(controller: &CheckoutController) {
        controller
            .update_field(FormField::Email("client@example.com".to_string()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_full_success_flow() {
        let gateway = Arc::new(SimulatedGateway::new(SimulatedBehaviour::Approve));
        let controller = CheckoutController::spawn(config(0), gateway.clone());
        with_email(&controller).await;

        let total = controller.request_quote().await.unwrap();
        assert_eq!(total, MinorUnits(120000));
        assert_eq!(controller.snapshot().await.unwrap().state, FlowState::Ready);

        let payment = controller.confirm_payment().await.unwrap();
        assert_eq!(payment.amount, total);
        assert_eq!(payment.public_key, "pk_test_local");

        let done = controller.wait_for_terminal().await.unwrap();
        assert_eq!(
            done.state,
            FlowState::Terminal(PaymentOutcome::Success {
                reference: payment.reference.clone()
            })
        );
        assert!(matches!(done.notice, Some(Notice::PaymentSucceeded(_))));
        assert_eq!(gateway.attempts().await, vec![payment]);
    }

    #[tokio::test]
    async fn test_cancelled_flow_is_terminal() {
        let gateway = Arc::new(SimulatedGateway::new(SimulatedBehaviour::Decline));
        let controller = CheckoutController::spawn(config(0), gateway.clone());
        with_email(&controller).await;
        controller.request_quote().await.unwrap();
        controller.confirm_payment().await.unwrap();

        let done = controller.wait_for_terminal().await.unwrap();
        assert_eq!(done.state, FlowState::Terminal(PaymentOutcome::Cancelled));
        assert_eq!(done.notice.unwrap().message(), PAYMENT_CANCELLED_MESSAGE);

        assert!(matches!(
            controller.confirm_payment().await,
            Err(CheckoutError::InvalidTransition { .. })
        ));
        assert_eq!(gateway.attempts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_cancellation() {
        let gateway = Arc::new(SimulatedGateway::new(SimulatedBehaviour::Fail));
        let controller = CheckoutController::spawn(config(0), gateway);
        with_email(&controller).await;
        controller.request_quote().await.unwrap();
        controller.confirm_payment().await.unwrap();

        let done = controller.wait_for_terminal().await.unwrap();
        assert_eq!(done.state, FlowState::Terminal(PaymentOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_missing_email_is_recovered_locally() {
        let gateway = Arc::new(SimulatedGateway::new(SimulatedBehaviour::Approve));
        let controller = CheckoutController::spawn(config(0), gateway);

        let result = controller.request_quote().await;
        assert!(matches!(result, Err(CheckoutError::Validation(_))));

        let snapshot = controller.snapshot().await.unwrap();
        assert_eq!(snapshot.state, FlowState::Collecting);
        assert!(snapshot.quote.is_none());
        assert!(!snapshot.busy);
        assert!(matches!(snapshot.notice, Some(Notice::Validation(_))));

        // Still editable.
        with_email(&controller).await;
        assert!(controller.request_quote().await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_quote_request_is_ignored() {
        let gateway = Arc::new(SimulatedGateway::new(SimulatedBehaviour::Approve));
        let controller = CheckoutController::spawn(config(200), gateway);
        with_email(&controller).await;

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.request_quote().await }
        });

        while !controller.snapshot().await.unwrap().busy {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            controller.request_quote().await,
            Err(CheckoutError::Busy)
        ));
        assert!(matches!(
            controller.confirm_payment().await,
            Err(CheckoutError::InvalidTransition { .. })
        ));
        assert!(matches!(
            controller
                .update_field(FormField::Tier(ServiceTier::Advanced))
                .await,
            Err(CheckoutError::Busy)
        ));

        assert_eq!(first.await.unwrap().unwrap(), MinorUnits(120000));
        assert_eq!(controller.snapshot().await.unwrap().state, FlowState::Ready);
    }

    #[tokio::test]
    async fn test_confirm_returns_before_gateway_resolves() {
        let gateway = Arc::new(
            SimulatedGateway::new(SimulatedBehaviour::Approve)
                .with_latency(Duration::from_millis(200)),
        );
        let controller = CheckoutController::spawn(config(0), gateway);
        with_email(&controller).await;
        controller.request_quote().await.unwrap();

        let payment = controller.confirm_payment().await.unwrap();
        let snapshot = controller.snapshot().await.unwrap();
        assert_eq!(
            snapshot.state,
            FlowState::PaymentPending {
                reference: payment.reference
            }
        );

        assert!(controller.wait_for_terminal().await.unwrap().state.is_terminal());
    }

    #[tokio::test]
    async fn test_silent_gateway_leaves_payment_pending() {
        let gateway = Arc::new(SimulatedGateway::new(SimulatedBehaviour::Hang));
        let controller = CheckoutController::spawn(config(0), gateway);
        with_email(&controller).await;
        controller.request_quote().await.unwrap();
        controller.confirm_payment().await.unwrap();

        let waited =
            tokio::time::timeout(Duration::from_millis(100), controller.wait_for_terminal()).await;
        assert!(waited.is_err());
        assert!(matches!(
            controller.snapshot().await.unwrap().state,
            FlowState::PaymentPending { .. }
        ));
    }
}
