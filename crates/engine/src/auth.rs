// In crates/engine/src/auth.rs

use core_types::SubscriptionTier;
use identity::SessionInfo;

/// The session authorization gate.
///
/// Every protected surface goes through the same small machine:
/// `Unauthenticated -> AwaitingProfile -> Authorized(tier) | Denied`. It is
/// re-evaluated on every session-change event, because the identity session
/// is itself asynchronous: an email can be verified later, a sign-out can
/// arrive from another client. Entitlement decisions are only ever computed
/// from an `Authorized` state, never from partial data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    AwaitingProfile { uid: String, email: String },
    Authorized { uid: String, tier: SubscriptionTier },
    Denied { reason: DenialReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// Verified identity but no profile document: the account was never
    /// fully created.
    ProfileMissing,
    /// The profile fetch failed; retryable.
    ProfileFetchFailed { message: String },
    /// The profile names a plan this version does not recognize.
    UnrecognizedPlan { message: String },
    /// The profile exists but the subscription has lapsed.
    SubscriptionInactive,
}

/// What the controller must do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCommand {
    None,
    /// Route to the login entry point.
    RedirectToLogin,
    /// Fetch the subscription profile for this uid.
    FetchProfile { uid: String },
    /// Route to account re-creation.
    RedirectToSignup,
    /// Show a retryable failure without leaving the page.
    SurfaceError { message: String },
}

/// Applies a session-change event.
///
/// A verified session always restarts the profile fetch, even when one was
/// already authorized: a refreshed session may belong to a different user or
/// carry a changed profile. An unverified or absent session never triggers a
/// profile fetch.
pub fn on_session_change(event: Option<&SessionInfo>) -> (AuthState, AuthCommand) {
    match event {
        Some(session) if session.email_verified => (
            AuthState::AwaitingProfile {
                uid: session.uid.clone(),
                email: session.email.clone(),
            },
            AuthCommand::FetchProfile {
                uid: session.uid.clone(),
            },
        ),
        Some(session) => {
            tracing::info!(uid = %session.uid, "Session present but email unverified.");
            (AuthState::Unauthenticated, AuthCommand::RedirectToLogin)
        }
        None => (AuthState::Unauthenticated, AuthCommand::RedirectToLogin),
    }
}

/// Applies the outcome of the profile fetch requested by `on_session_change`.
pub fn on_profile_result(
    state: &AuthState,
    result: identity::Result<core_types::SubscriptionProfile>,
) -> (AuthState, AuthCommand) {
    let AuthState::AwaitingProfile { uid, .. } = state else {
        // A late fetch result for a state we already left is dropped.
        tracing::warn!(state = ?state, "Ignoring profile result outside AwaitingProfile.");
        return (state.clone(), AuthCommand::None);
    };

    match result {
        Ok(profile) => {
            if !profile.is_active {
                return (
                    AuthState::Denied {
                        reason: DenialReason::SubscriptionInactive,
                    },
                    AuthCommand::RedirectToSignup,
                );
            }
            match profile.plan.parse::<SubscriptionTier>() {
                Ok(tier) => (
                    AuthState::Authorized {
                        uid: uid.clone(),
                        tier,
                    },
                    AuthCommand::None,
                ),
                Err(e) => (
                    AuthState::Denied {
                        reason: DenialReason::UnrecognizedPlan {
                            message: e.to_string(),
                        },
                    },
                    AuthCommand::SurfaceError {
                        message: e.to_string(),
                    },
                ),
            }
        }
        Err(identity::Error::ProfileNotFound { .. }) => (
            AuthState::Denied {
                reason: DenialReason::ProfileMissing,
            },
            AuthCommand::RedirectToSignup,
        ),
        Err(e) => (
            AuthState::Denied {
                reason: DenialReason::ProfileFetchFailed {
                    message: e.to_string(),
                },
            },
            AuthCommand::SurfaceError {
                message: e.to_string(),
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::SubscriptionProfile;

    fn verified_session() -> SessionInfo {
        SessionInfo {
            uid: "uid-1".to_string(),
            email: "trader@example.com".to_string(),
            email_verified: true,
        }
    }

    fn active_profile(plan: &str) -> SubscriptionProfile {
        SubscriptionProfile {
            plan: plan.to_string(),
            billing_cycle: "monthly".to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn verified_session_awaits_profile() {
        let (state, command) = on_session_change(Some(&verified_session()));
        assert_eq!(
            state,
            AuthState::AwaitingProfile {
                uid: "uid-1".to_string(),
                email: "trader@example.com".to_string(),
            }
        );
        assert_eq!(
            command,
            AuthCommand::FetchProfile {
                uid: "uid-1".to_string()
            }
        );
    }

    #[test]
    fn unverified_session_stays_unauthenticated_without_a_profile_fetch() {
        let session = SessionInfo {
            email_verified: false,
            ..verified_session()
        };
        let (state, command) = on_session_change(Some(&session));
        assert_eq!(state, AuthState::Unauthenticated);
        assert_eq!(command, AuthCommand::RedirectToLogin);
    }

    #[test]
    fn null_session_redirects_to_login() {
        let (state, command) = on_session_change(None);
        assert_eq!(state, AuthState::Unauthenticated);
        assert_eq!(command, AuthCommand::RedirectToLogin);
    }

    #[test]
    fn recognized_plan_authorizes() {
        let (awaiting, _) = on_session_change(Some(&verified_session()));
        let (state, command) = on_profile_result(&awaiting, Ok(active_profile("Annual")));
        assert_eq!(
            state,
            AuthState::Authorized {
                uid: "uid-1".to_string(),
                tier: SubscriptionTier::Premium,
            }
        );
        assert_eq!(command, AuthCommand::None);
    }

    #[test]
    fn missing_profile_denies_and_redirects_to_signup() {
        let (awaiting, _) = on_session_change(Some(&verified_session()));
        let (state, command) = on_profile_result(
            &awaiting,
            Err(identity::Error::ProfileNotFound {
                uid: "uid-1".to_string(),
            }),
        );
        assert_eq!(
            state,
            AuthState::Denied {
                reason: DenialReason::ProfileMissing
            }
        );
        assert_eq!(command, AuthCommand::RedirectToSignup);
    }

    #[test]
    fn fetch_failure_denies_as_retryable() {
        let (awaiting, _) = on_session_change(Some(&verified_session()));
        let (state, command) = on_profile_result(&awaiting, Err(identity::Error::NotSignedIn));
        assert!(matches!(
            state,
            AuthState::Denied {
                reason: DenialReason::ProfileFetchFailed { .. }
            }
        ));
        assert!(matches!(command, AuthCommand::SurfaceError { .. }));
    }

    #[test]
    fn unrecognized_plan_is_surfaced_never_defaulted() {
        let (awaiting, _) = on_session_change(Some(&verified_session()));
        let (state, command) = on_profile_result(&awaiting, Ok(active_profile("12 Months")));
        assert!(matches!(
            state,
            AuthState::Denied {
                reason: DenialReason::UnrecognizedPlan { .. }
            }
        ));
        assert!(matches!(command, AuthCommand::SurfaceError { .. }));
    }

    #[test]
    fn inactive_subscription_denies() {
        let (awaiting, _) = on_session_change(Some(&verified_session()));
        let profile = SubscriptionProfile {
            is_active: false,
            ..active_profile("1 Month")
        };
        let (state, command) = on_profile_result(&awaiting, Ok(profile));
        assert_eq!(
            state,
            AuthState::Denied {
                reason: DenialReason::SubscriptionInactive
            }
        );
        assert_eq!(command, AuthCommand::RedirectToSignup);
    }

    #[test]
    fn late_profile_result_outside_awaiting_is_ignored() {
        let state = AuthState::Unauthenticated;
        let (next, command) = on_profile_result(&state, Ok(active_profile("1 Month")));
        assert_eq!(next, AuthState::Unauthenticated);
        assert_eq!(command, AuthCommand::None);
    }
}
