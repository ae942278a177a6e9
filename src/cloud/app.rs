//! The cooperative loop driving a cloud device session.

use super::callbacks::{CallbackRegistry, Dispatcher};
use super::error::Error;
use super::property::AppContext;
use super::{Clock, LoopConfig, MessageType, Session, SessionConfig};

/// What a finished run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopSummary {
    /// Property posts accepted by the driver.
    pub posts: u32,
    /// Property posts refused by the driver.
    pub post_failures: u32,
    /// Seconds elapsed when the loop returned.
    pub elapsed_s: u64,
}

/// A cloud device application: one session, one context, one loop.
#[derive(Debug)]
pub struct CloudApp<'a, S: Session, C: Clock> {
    session: S,
    clock: C,
    session_config: SessionConfig<'a>,
    config: LoopConfig,
    ctx: AppContext,
    registry: CallbackRegistry,
    start_ms: Option<u64>,
}

impl<'a, S: Session, C: Clock> CloudApp<'a, S, C> {
    /// Creates an application with the default callbacks registered.
    pub fn new(
        session: S,
        clock: C,
        session_config: SessionConfig<'a>,
        config: LoopConfig,
    ) -> Self {
        Self {
            session,
            clock,
            session_config,
            config,
            ctx: AppContext::new(),
            registry: CallbackRegistry::with_defaults(),
            start_ms: None,
        }
    }

    /// Returns the application context.
    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Returns the callback registry, to override or remove handlers.
    pub fn registry_mut(&mut self) -> &mut CallbackRegistry {
        &mut self.registry
    }

    /// Returns the session driver.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Whole seconds since the first call.
    pub fn uptime_s(&mut self) -> u64 {
        let now = self.clock.uptime_ms();
        let start = *self.start_ms.get_or_insert(now);
        now.saturating_sub(start) / 1000
    }

    /// Post both properties in one report.
    ///
    /// Returns the message id assigned by the driver.
    pub fn post_all_properties(&mut self) -> Result<i32, Error> {
        let payload = self.ctx.render_payload()?;
        match self.session.report(
            self.ctx.device_id,
            MessageType::PostProperty,
            payload.as_bytes(),
        ) {
            Ok(msgid) => {
                info!(
                    "property post ok, msgid {=i32}, payload {=str}",
                    msgid, payload.as_str()
                );
                Ok(msgid)
            }
            Err(_) => {
                warn!("property post failed");
                Err(Error::ReportFailure)
            }
        }
    }

    /// Open and connect the session, then run the loop.
    ///
    /// Returns when the configured execution time has passed; with no
    /// execution time it never returns once connected.
    ///
    /// # Errors
    ///
    /// * [`Error::SessionOpenFailure`] - the session could not be created
    /// * [`Error::SessionConnectFailure`] - the session could not connect
    pub fn run(&mut self) -> Result<LoopSummary, Error> {
        self.ctx = AppContext::new();
        self.start_ms = None;
        self.configure_session();

        let device_id = self.session.open(&self.session_config.meta).map_err(|_| {
            warn!("session open failed");
            Error::SessionOpenFailure
        })?;
        self.ctx.device_id = device_id;
        info!("session open, devid {=i32}", device_id);

        if self.session.connect(device_id).is_err() {
            warn!("session connect failed");
            let _ = self.session.close(device_id);
            return Err(Error::SessionConnectFailure);
        }
        info!("session connected, entering loop");

        let summary = self.run_loop();

        if self.session.close(device_id).is_err() {
            warn!("session close failed");
        }
        Ok(summary)
    }

    fn configure_session(&mut self) {
        if self
            .session
            .set_mqtt_domain(self.session_config.mqtt_domain)
            .is_err()
        {
            warn!("setting mqtt domain failed");
        }
        if let Some(endpoint) = self.session_config.custom_endpoint() {
            if self.session.set_endpoint(endpoint).is_err() {
                warn!("setting endpoint failed");
            }
        }
        if self
            .session
            .set_event_reply(self.session_config.event_reply)
            .is_err()
        {
            warn!("setting event reply failed");
        }
    }

    fn run_loop(&mut self) -> LoopSummary {
        let period = self.config.post_period_s.max(1);
        let mut summary = LoopSummary::default();
        let mut prev_s = 0;

        loop {
            let mut sink = Dispatcher::new(&self.registry, &mut self.ctx);
            self.session
                .yield_for(self.config.yield_timeout_ms, &mut sink);

            let now_s = self.uptime_s();
            if now_s == prev_s {
                continue;
            }

            if now_s % period == 0 {
                match self.post_all_properties() {
                    Ok(_) => summary.posts += 1,
                    Err(_) => summary.post_failures += 1,
                }
            }

            if let Some(limit) = self.config.execution_time_s {
                if now_s > limit {
                    info!("execution time reached, leaving loop");
                    summary.elapsed_s = now_s;
                    return summary;
                }
            }

            prev_s = now_s;
        }
    }
}
