use super::test_helpers::*;
use super::*;

fn epoch() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
}

// =============================================================================
// Profile::new_default
// =============================================================================

#[test]
fn new_default_seeds_identity_fields() {
    let session = sample_session();
    let profile = Profile::new_default(&session, epoch());

    assert_eq!(profile.id, session.user_id);
    assert_eq!(profile.email, session.email);
    assert_eq!(profile.full_name.as_deref(), Some("Ada Lovelace"));
    assert!(!profile.profile_completed);
    assert_eq!(profile.created_at, epoch());
    assert_eq!(profile.updated_at, epoch());
}

#[test]
fn new_default_without_name_uses_empty_string() {
    let mut session = sample_session();
    session.full_name = None;
    let profile = Profile::new_default(&session, epoch());
    assert_eq!(profile.full_name.as_deref(), Some(""));
}

#[test]
fn new_default_is_missing_required_fields() {
    let profile = Profile::new_default(&sample_session(), epoch());
    let missing = profile.missing_required_fields();
    assert!(missing.contains(&"college"));
    assert!(missing.contains(&"graduation_year"));
    assert!(!missing.contains(&"email"));
}

// =============================================================================
// ProfileUpdate::apply
// =============================================================================

#[test]
fn completed_profile_has_no_missing_fields() {
    let profile = completed_profile(&sample_session());
    assert!(profile.missing_required_fields().is_empty());
    assert!(profile.profile_completed);
}

#[test]
fn apply_leaves_unset_fields_alone() {
    let base = completed_profile(&sample_session());
    let updated = ProfileUpdate { bio: Some("hello".into()), ..ProfileUpdate::default() }.apply(base.clone(), epoch());

    assert_eq!(updated.bio.as_deref(), Some("hello"));
    assert_eq!(updated.college, base.college);
    assert!(updated.profile_completed);
}

#[test]
fn apply_trims_text() {
    let base = Profile::new_default(&sample_session(), epoch());
    let updated = ProfileUpdate { location: Some("  Paris \n".into()), ..ProfileUpdate::default() }.apply(base, epoch());
    assert_eq!(updated.location.as_deref(), Some("Paris"));
}

#[test]
fn blanking_required_field_uncompletes_profile() {
    let base = completed_profile(&sample_session());
    let updated = ProfileUpdate { college: Some("   ".into()), ..ProfileUpdate::default() }.apply(base, epoch());

    assert!(!updated.profile_completed);
    assert_eq!(updated.missing_required_fields(), vec!["college"]);
}

#[test]
fn partial_update_stays_incomplete() {
    let base = Profile::new_default(&sample_session(), epoch());
    let updated = ProfileUpdate { college: Some("MIT".into()), ..ProfileUpdate::default() }.apply(base, epoch());
    assert!(!updated.profile_completed);
}

#[test]
fn apply_sets_updated_at_only() {
    let base = Profile::new_default(&sample_session(), epoch());
    let later = epoch() + time::Duration::days(1);
    let updated = ProfileUpdate::default().apply(base, later);

    assert_eq!(updated.created_at, epoch());
    assert_eq!(updated.updated_at, later);
}

#[test]
fn update_deserializes_from_partial_json() {
    let update: ProfileUpdate = serde_json::from_str(r#"{"college":"MIT","graduation_year":2027}"#).unwrap();
    assert_eq!(update.college.as_deref(), Some("MIT"));
    assert_eq!(update.graduation_year, Some(2027));
    assert!(update.full_name.is_none());
}

// =============================================================================
// CombinedState
// =============================================================================

#[test]
fn default_state_is_loading() {
    let state = CombinedState::default();
    assert!(state.is_loading());
    assert!(state.session.is_none());
}

#[test]
fn either_flag_means_loading() {
    let mut state = state_with(None, None);
    assert!(!state.is_loading());
    state.loading_profile = true;
    assert!(state.is_loading());
    state.loading_profile = false;
    state.loading_session = true;
    assert!(state.is_loading());
}

#[test]
fn state_serializes_profile_timestamps_as_rfc3339() {
    let session = sample_session();
    let mut profile = completed_profile(&session);
    profile.created_at = epoch();
    let json = serde_json::to_value(state_with(Some(session), Some(profile))).unwrap();
    assert_eq!(json["profile"]["created_at"], "1970-01-01T00:00:00Z");
    assert_eq!(json["loading_profile"], false);
}

#[test]
fn stage_follows_classification() {
    let session = sample_session();
    assert_eq!(CombinedState::default().stage(), None);
    assert_eq!(state_with(None, None).stage(), Some(GateStage::Unauthenticated));
    let profile = completed_profile(&session);
    assert_eq!(state_with(Some(session), Some(profile)).stage(), Some(GateStage::Ready));
}
