//! Event kinds, the callback registry and the default handlers.
//!
//! The session driver raises events while it runs. Each event kind maps to
//! at most one handler in a [`CallbackRegistry`]; handlers receive the
//! application context explicitly and may return a response the driver
//! sends back to the cloud (service and property-get requests).

use super::EventSink;
use super::error::Error;
use super::property::AppContext;
use heapless::{FnvIndexMap, String};

/// Maximum length of a handler response.
pub const MAX_RESPONSE_LEN: usize = 128;

/// Number of registry slots; one per [`EventKind`].
pub const MAX_CALLBACKS: usize = 8;

/// Placeholder logged when a reply carries no body.
pub const EMPTY_REPLY: &str = "NULL";

/// A response a handler hands back to the session driver.
pub type Response = String<MAX_RESPONSE_LEN>;

/// Result type for event handlers.
pub type HandlerResult = Result<Option<Response>, Error>;

/// An event handler.
pub type Handler = fn(&mut AppContext, &Event<'_>) -> HandlerResult;

/// The kinds of events a handler can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The session connected to the cloud.
    ConnectSuccess,
    /// The session lost its connection.
    Disconnected,
    /// The cloud invoked a service on the device.
    ServiceRequest,
    /// The cloud set one or more properties.
    PropertySet,
    /// The cloud asked for property values.
    PropertyGet,
    /// The cloud acknowledged a property post.
    ReportReply,
    /// The cloud acknowledged an event post.
    TriggerEventReply,
    /// The device finished its initial subscriptions.
    InitializeCompleted,
}

/// An event raised by the session driver, with its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// The session connected to the cloud.
    ConnectSuccess,
    /// The session lost its connection.
    Disconnected,
    /// The cloud invoked a service on the device.
    ServiceRequest {
        /// Target device.
        devid: i32,
        /// Service identifier.
        service_id: &'a str,
        /// Request payload.
        request: &'a str,
    },
    /// The cloud set one or more properties.
    PropertySet {
        /// Target device.
        devid: i32,
        /// Request payload.
        request: &'a str,
    },
    /// The cloud asked for property values.
    PropertyGet {
        /// Target device.
        devid: i32,
        /// Request payload.
        request: &'a str,
    },
    /// The cloud acknowledged a property post.
    ReportReply {
        /// Reporting device.
        devid: i32,
        /// Message id of the acknowledged post.
        msgid: i32,
        /// Result code.
        code: i32,
        /// Reply body, if any.
        reply: Option<&'a str>,
    },
    /// The cloud acknowledged an event post.
    TriggerEventReply {
        /// Reporting device.
        devid: i32,
        /// Message id of the acknowledged post.
        msgid: i32,
        /// Result code.
        code: i32,
        /// Event identifier.
        event_id: &'a str,
        /// Reply message.
        message: &'a str,
    },
    /// The device finished its initial subscriptions.
    InitializeCompleted {
        /// Initialized device.
        devid: i32,
    },
}

impl Event<'_> {
    /// The registry key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ConnectSuccess => EventKind::ConnectSuccess,
            Event::Disconnected => EventKind::Disconnected,
            Event::ServiceRequest { .. } => EventKind::ServiceRequest,
            Event::PropertySet { .. } => EventKind::PropertySet,
            Event::PropertyGet { .. } => EventKind::PropertyGet,
            Event::ReportReply { .. } => EventKind::ReportReply,
            Event::TriggerEventReply { .. } => EventKind::TriggerEventReply,
            Event::InitializeCompleted { .. } => EventKind::InitializeCompleted,
        }
    }
}

/// Mapping from event kind to handler.
///
/// # Examples
///
/// ```rust
/// use sensorlink::cloud::{AppContext, CallbackRegistry, Event};
///
/// let registry = CallbackRegistry::with_defaults();
/// let mut ctx = AppContext::new();
///
/// registry.dispatch(&mut ctx, &Event::ConnectSuccess).unwrap();
/// assert!(ctx.cloud_connected);
/// ```
#[derive(Debug, Clone)]
pub struct CallbackRegistry {
    handlers: FnvIndexMap<EventKind, Handler, MAX_CALLBACKS>,
}

impl CallbackRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: FnvIndexMap::new(),
        }
    }

    /// Creates a registry holding the default handler for every event kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (kind, handler) in DEFAULT_HANDLERS {
            // One slot per kind, so the registry cannot fill up here.
            let _ = registry.register(kind, handler);
        }
        registry
    }

    /// Register `handler` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: EventKind, handler: Handler) -> Result<(), Error> {
        self.handlers
            .insert(kind, handler)
            .map_err(|_| Error::BufferOverflow)?;
        Ok(())
    }

    /// Remove the handler for `kind`, returning it.
    pub fn unregister(&mut self, kind: EventKind) -> Option<Handler> {
        self.handlers.remove(&kind)
    }

    /// Whether a handler is registered for `kind`.
    pub fn is_registered(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Invoke the handler registered for the event's kind.
    ///
    /// Events without a handler are acknowledged with `Ok(None)`.
    pub fn dispatch(&self, ctx: &mut AppContext, event: &Event<'_>) -> HandlerResult {
        match self.handlers.get(&event.kind()) {
            Some(handler) => handler(ctx, event),
            None => Ok(None),
        }
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Binds a registry to a context so the session driver can deliver events.
#[derive(Debug)]
pub struct Dispatcher<'r, 'c> {
    registry: &'r CallbackRegistry,
    ctx: &'c mut AppContext,
}

impl<'r, 'c> Dispatcher<'r, 'c> {
    /// Creates a dispatcher over `registry` and `ctx`.
    pub fn new(registry: &'r CallbackRegistry, ctx: &'c mut AppContext) -> Self {
        Self { registry, ctx }
    }
}

impl EventSink for Dispatcher<'_, '_> {
    fn on_event(&mut self, event: &Event<'_>) -> HandlerResult {
        self.registry.dispatch(self.ctx, event)
    }
}

const DEFAULT_HANDLERS: [(EventKind, Handler); MAX_CALLBACKS] = [
    (EventKind::ConnectSuccess, on_connected),
    (EventKind::Disconnected, on_disconnected),
    (EventKind::ServiceRequest, on_service_request),
    (EventKind::PropertySet, on_property_set),
    (EventKind::PropertyGet, on_property_get),
    (EventKind::ReportReply, on_report_reply),
    (EventKind::TriggerEventReply, on_trigger_event_reply),
    (EventKind::InitializeCompleted, on_initialized),
];

/// Marks the cloud as connected.
pub fn on_connected(ctx: &mut AppContext, _event: &Event<'_>) -> HandlerResult {
    info!("cloud connected");
    ctx.cloud_connected = true;
    Ok(None)
}

/// Marks the cloud as disconnected.
pub fn on_disconnected(ctx: &mut AppContext, _event: &Event<'_>) -> HandlerResult {
    info!("cloud disconnected");
    ctx.cloud_connected = false;
    Ok(None)
}

/// Logs the request; no services are implemented.
pub fn on_service_request(_ctx: &mut AppContext, event: &Event<'_>) -> HandlerResult {
    if let Event::ServiceRequest {
        devid,
        service_id,
        request,
    } = event
    {
        info!(
            "service request, devid {=i32}, service {=str}, payload {=str}",
            *devid, *service_id, *request
        );
    }
    Ok(None)
}

/// Applies `Data` / `Status` values sent by the cloud.
pub fn on_property_set(ctx: &mut AppContext, event: &Event<'_>) -> HandlerResult {
    if let Event::PropertySet { devid, request } = event {
        info!(
            "property set, devid {=i32}, payload {=str}",
            *devid, *request
        );
        ctx.apply_property_set(request)?;
    }
    Ok(None)
}

/// Answers with the current property payload.
pub fn on_property_get(ctx: &mut AppContext, event: &Event<'_>) -> HandlerResult {
    if !matches!(event, Event::PropertyGet { .. }) {
        return Ok(None);
    }
    let payload = ctx.render_payload()?;
    let response = Response::try_from(payload.as_str()).map_err(|_| Error::BufferOverflow)?;
    Ok(Some(response))
}

/// Logs the acknowledgement of a property post.
pub fn on_report_reply(_ctx: &mut AppContext, event: &Event<'_>) -> HandlerResult {
    if let Event::ReportReply {
        devid,
        msgid,
        code,
        reply,
    } = event
    {
        let reply = reply.unwrap_or(EMPTY_REPLY);
        info!(
            "property post reply, devid {=i32}, msgid {=i32}, code {=i32}, reply {=str}",
            *devid, *msgid, *code, reply
        );
    }
    Ok(None)
}

/// Logs the acknowledgement of an event post.
pub fn on_trigger_event_reply(_ctx: &mut AppContext, event: &Event<'_>) -> HandlerResult {
    if let Event::TriggerEventReply {
        devid,
        msgid,
        code,
        event_id,
        message,
    } = event
    {
        info!(
            "event reply, devid {=i32}, msgid {=i32}, code {=i32}, event {=str}, message {=str}",
            *devid, *msgid, *code, *event_id, *message
        );
    }
    Ok(None)
}

/// Marks the device initialized if the event is for this device.
pub fn on_initialized(ctx: &mut AppContext, event: &Event<'_>) -> HandlerResult {
    if let Event::InitializeCompleted { devid } = event {
        info!("device initialized, devid {=i32}", *devid);
        if *devid == ctx.device_id {
            ctx.device_initialized = true;
        }
    }
    Ok(None)
}
