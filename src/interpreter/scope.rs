//! Per-call context
//!
//! Every crossing into the script installs a `CallScope` for its duration.
//! The Python-facing callbacks (`XBMC_Log`, `PVR_Transfer*`) find the host
//! and, for list requests, the target list through it. Scopes are per
//! thread and nest; dropping the guard restores the previous one.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use thiserror::Error;

use crate::host::{Entry, PvrHost, TransferHandle};
use crate::schema::RecordKind;

/// Host list a request is filling and the record kind it accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferTarget {
    pub handle: TransferHandle,
    pub kind: RecordKind,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("no PVR list request is in progress")]
    NoRequest,

    #[error("cannot transfer a {found} while the host is listing {expected} records")]
    WrongKind {
        expected: RecordKind,
        found: RecordKind,
    },
}

pub struct CallScope {
    host: Arc<dyn PvrHost>,
    target: Option<TransferTarget>,
    transferred: Cell<usize>,
}

impl CallScope {
    pub fn new(host: Arc<dyn PvrHost>, target: Option<TransferTarget>) -> Self {
        Self {
            host,
            target,
            transferred: Cell::new(0),
        }
    }

    pub fn host(&self) -> &dyn PvrHost {
        self.host.as_ref()
    }

    pub fn target(&self) -> Option<TransferTarget> {
        self.target
    }

    /// Records handed to the host so far in this scope
    pub fn transferred(&self) -> usize {
        self.transferred.get()
    }

    /// Forward one record to the host list of the current request
    pub fn transfer(&self, entry: &Entry) -> Result<(), TransferError> {
        let target = self.target.ok_or(TransferError::NoRequest)?;
        if entry.kind() != target.kind {
            return Err(TransferError::WrongKind {
                expected: target.kind,
                found: entry.kind(),
            });
        }
        self.host.transfer(target.handle, entry);
        self.transferred.set(self.transferred.get() + 1);
        Ok(())
    }
}

thread_local! {
    static ACTIVE: RefCell<Option<Rc<CallScope>>> = RefCell::new(None);
}

/// Restores the enclosing scope on drop
#[must_use]
pub struct ScopeGuard {
    previous: Option<Rc<CallScope>>,
    scope: Rc<CallScope>,
}

impl ScopeGuard {
    pub fn scope(&self) -> &CallScope {
        &self.scope
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ACTIVE.with(|active| *active.borrow_mut() = previous);
    }
}

pub fn enter(scope: CallScope) -> ScopeGuard {
    let scope = Rc::new(scope);
    let previous = ACTIVE.with(|active| active.replace(Some(scope.clone())));
    ScopeGuard { previous, scope }
}

pub fn current() -> Option<Rc<CallScope>> {
    ACTIVE.with(|active| active.borrow().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LogLevel;
    use crate::schema::{Channel, Timer};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<Entry>>);

    impl PvrHost for Collect {
        fn log(&self, _level: LogLevel, _message: &str) {}

        fn transfer(&self, _handle: TransferHandle, entry: &Entry) {
            self.0.lock().unwrap().push(entry.clone());
        }
    }

    fn target(kind: RecordKind) -> Option<TransferTarget> {
        Some(TransferTarget {
            handle: TransferHandle::new(std::ptr::null_mut()),
            kind,
        })
    }

    #[test]
    fn test_scopes_nest_and_restore() {
        let host: Arc<dyn PvrHost> = Arc::new(Collect::default());
        assert!(current().is_none());
        {
            let _outer = enter(CallScope::new(host.clone(), None));
            assert!(current().unwrap().target().is_none());
            {
                let _inner = enter(CallScope::new(host.clone(), target(RecordKind::Channel)));
                assert_eq!(current().unwrap().target().unwrap().kind, RecordKind::Channel);
            }
            assert!(current().unwrap().target().is_none());
        }
        assert!(current().is_none());
    }

    #[test]
    fn test_transfer_checks_request_and_kind() {
        let collect = Arc::new(Collect::default());
        let host: Arc<dyn PvrHost> = collect.clone();

        let idle = CallScope::new(host.clone(), None);
        assert_eq!(
            idle.transfer(&Entry::Channel(Channel::default())),
            Err(TransferError::NoRequest)
        );

        let listing = CallScope::new(host, target(RecordKind::Channel));
        assert_eq!(
            listing.transfer(&Entry::Timer(Timer::default())),
            Err(TransferError::WrongKind {
                expected: RecordKind::Channel,
                found: RecordKind::Timer,
            })
        );
        listing.transfer(&Entry::Channel(Channel::default())).unwrap();
        assert_eq!(listing.transferred(), 1);
        assert_eq!(collect.0.lock().unwrap().len(), 1);
    }
}
