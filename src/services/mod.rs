// EdgeTabs services
// Services talk to collaborators: host events, the debounce timer, persistence, broadcasts, UI intents, settings.

pub mod command_dispatcher;
pub mod debouncer;
pub mod event_bus;
pub mod gateway;
pub mod settings_store;
