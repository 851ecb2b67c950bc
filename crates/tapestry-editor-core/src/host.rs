//! The host page's native command surface.
//!
//! Commands the engine does not implement itself are forwarded here, but
//! only when the host reports them enabled. The browser implementation
//! calls `document.execCommand` and friends; `NullHost` supports nothing.

/// Native command execution and focus handling provided by the host.
pub trait CommandHost {
    /// Whether the host can run `command` right now.
    fn query_command_enabled(&self, command: &str) -> bool;

    /// The host's own idea of whether `command` is active. `None` when the
    /// host does not know the command.
    fn query_command_state(&self, command: &str) -> Option<bool>;

    /// Runs a native command. Returns whether anything happened.
    fn exec_command(&mut self, command: &str, show_ui: bool, value: &str) -> bool;

    /// Gives keyboard focus back to the editing surface.
    fn focus(&mut self) {}
}

/// A host without native commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl CommandHost for NullHost {
    fn query_command_enabled(&self, _command: &str) -> bool {
        false
    }

    fn query_command_state(&self, _command: &str) -> Option<bool> {
        None
    }

    fn exec_command(&mut self, _command: &str, _show_ui: bool, _value: &str) -> bool {
        false
    }
}

impl<H: CommandHost + ?Sized> CommandHost for Box<H> {
    fn query_command_enabled(&self, command: &str) -> bool {
        (**self).query_command_enabled(command)
    }

    fn query_command_state(&self, command: &str) -> Option<bool> {
        (**self).query_command_state(command)
    }

    fn exec_command(&mut self, command: &str, show_ui: bool, value: &str) -> bool {
        (**self).exec_command(command, show_ui, value)
    }

    fn focus(&mut self) {
        (**self).focus()
    }
}
