//! Authorization policy
//!
//! Every mutating service call asks [`authorize`] before touching the store.
//! `Administrador` may do everything. `Usuario` rights depend on the action,
//! the resource and the user's area:
//!
//! | Resource            | Usuario may                                        |
//! |---------------------|----------------------------------------------------|
//! | Order               | create/read for own area; Almacén reads all, dispatches |
//! | Inventory           | read; Almacén creates, updates, adds stock, deletes |
//! | Fuel                | read; Combustible and Almacén deposit and dispatch |
//! | Security report     | create/read; Seguridad closes incidents            |
//! | Vehicle             | read; Seguridad registers and removes              |
//! | Gallery post        | create/read; delete own                            |
//! | Chat                | read and post                                      |
//! | Notification        | read/mark read when addressed to own area or all   |
//! | Communication       | read                                               |
//! | User, Settings      | settings read only                                 |

use shared::error::{AppError, ErrorCode};
use shared::models::{Area, Recipient, ReportKind};

use crate::auth::CurrentUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Approve,
    Reject,
    Dispatch,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Order { requesting_area: Area },
    Inventory,
    Fuel,
    SecurityReport { kind: ReportKind },
    Vehicle,
    User { id: i64 },
    GalleryPost { author_id: i64 },
    Communication,
    Chat,
    Notification { recipient: Recipient },
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

fn allow_if(condition: bool, reason: &'static str) -> Decision {
    if condition {
        Decision::Allow
    } else {
        Decision::Deny(reason)
    }
}

pub fn authorize(user: &CurrentUser, action: Action, resource: &Resource) -> Decision {
    use Action::*;

    if user.is_admin() {
        return Decision::Allow;
    }

    match (resource, action) {
        (Resource::Order { requesting_area }, Read) => allow_if(
            *requesting_area == user.area || user.area == Area::Almacen,
            "orders of other areas are not visible",
        ),
        (Resource::Order { requesting_area }, Create) => allow_if(
            *requesting_area == user.area,
            "orders can only be requested for your own area",
        ),
        (Resource::Order { .. }, Dispatch) => allow_if(
            user.area == Area::Almacen,
            "only Almacén dispatches orders",
        ),
        (Resource::Order { .. }, Approve | Reject) => {
            Decision::Deny("only administrators approve or reject orders")
        }

        (Resource::Inventory, Read) => Decision::Allow,
        (Resource::Inventory, Create | Update | Delete) => allow_if(
            user.area == Area::Almacen,
            "only Almacén manages inventory",
        ),

        (Resource::Fuel, Read) => Decision::Allow,
        (Resource::Fuel, Create | Dispatch) => allow_if(
            matches!(user.area, Area::Combustible | Area::Almacen),
            "only Combustible and Almacén record fuel movements",
        ),

        (Resource::SecurityReport { .. }, Read | Create) => Decision::Allow,
        (Resource::SecurityReport { kind }, Close) => allow_if(
            *kind == ReportKind::Incidente && user.area == Area::Seguridad,
            "only Seguridad closes incidents",
        ),
        (Resource::SecurityReport { .. }, Approve | Reject) => {
            Decision::Deny("only administrators decide permits")
        }

        (Resource::Vehicle, Read) => Decision::Allow,
        (Resource::Vehicle, Create | Delete) => allow_if(
            user.area == Area::Seguridad,
            "only Seguridad manages registered vehicles",
        ),

        (Resource::GalleryPost { .. }, Read | Create) => Decision::Allow,
        (Resource::GalleryPost { author_id }, Delete) => allow_if(
            *author_id == user.id,
            "only the author can delete a gallery post",
        ),

        (Resource::Chat, Read | Create) => Decision::Allow,

        (Resource::Notification { recipient }, Read | Update) => allow_if(
            recipient.reaches(user.area),
            "notification is addressed to another area",
        ),

        (Resource::Communication, Read) => Decision::Allow,
        (Resource::Settings, Read) => Decision::Allow,

        (Resource::User { id }, Read) => allow_if(*id == user.id, "administrator required"),
        (Resource::User { .. } | Resource::Communication | Resource::Settings, _) => {
            Decision::Deny("administrator required")
        }

        _ => Decision::Deny("action not permitted"),
    }
}

/// [`authorize`] as a `Result`, for `?` in services
pub fn ensure(user: &CurrentUser, action: Action, resource: &Resource) -> Result<(), AppError> {
    match authorize(user, action, resource) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            tracing::debug!(
                user_id = user.id,
                area = %user.area,
                ?action,
                ?resource,
                "Authorization denied: {reason}"
            );
            let code = match resource {
                Resource::User { .. } | Resource::Communication | Resource::Settings => {
                    ErrorCode::AdminRequired
                }
                _ => ErrorCode::PermissionDenied,
            };
            Err(AppError::with_message(code, reason))
        }
    }
}
