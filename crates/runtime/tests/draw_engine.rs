mod common;

use sqlx::types::Uuid;

use common::{approved_card, engine_env, pool, FixedRoll, Fixture};
use promptdraw_runtime::{AccessRule, DrawError, DrawMethod, DrawRequest, PoolType, UserRole};

fn request(fixture: &Fixture, pool_id: Option<Uuid>) -> DrawRequest {
    DrawRequest { user_id: fixture.user.id, pool_id }
}

#[tokio::test]
async fn test_draw_commits_record_and_decrements_quota() {
    let mut fixture = Fixture::new(5);

    let outcome = fixture.engine
        .draw_with_rng(request(&fixture, None), &mut FixedRoll(0.96))
        .await
        .unwrap();

    // cumulative 0.95 < 0.96 <= 0.98
    assert_eq!(outcome.card.card.rarity_tier_id, 4);
    assert_eq!(outcome.card.rarity_name, "tier-4");
    assert_eq!(outcome.card.category, "fantasy");
    assert_eq!(outcome.remaining_draws, 4);
    assert_eq!(outcome.pool_id, fixture.standard_pool.id);
    assert_eq!(outcome.pool_name, fixture.standard_pool.name);
    assert_eq!(outcome.draw_method, DrawMethod::Random);
    assert_eq!(outcome.extra_attachment, None);
    assert!(!outcome.cascaded);
    assert!(!outcome.pity_degraded);

    assert_eq!(fixture.remaining(fixture.user.id), 4);
    let records = fixture.store.records(fixture.user.id);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, outcome.record_id);
    assert_eq!(records[0].rarity_tier_id, 4);
    assert_eq!(records[0].pool_id, fixture.standard_pool.id);

    let event = fixture.events.try_recv().unwrap();
    assert_eq!(event.user_id, fixture.user.id);
    assert_eq!(event.card_id, outcome.card.card.id);
    assert_eq!(event.rarity_tier_id, 4);
    assert_eq!(event.drawn_at, records[0].drawn_at);
    assert_eq!(outcome.drawn_at, records[0].drawn_at);
}

#[tokio::test]
async fn test_cumulative_boundaries_end_to_end() {
    let fixture = Fixture::new(10);
    let tier_at = |roll: f64| {
        let engine = fixture.engine.clone();
        let request = request(&fixture, None);
        async move {
            engine.draw_with_rng(request, &mut FixedRoll(roll)).await.unwrap().card.card.rarity_tier_id
        }
    };

    assert_eq!(tier_at(0.5).await, 1);
    assert_eq!(tier_at(0.79).await, 2);
    assert_eq!(tier_at(0.99).await, 5);
    assert_eq!(tier_at(0.996).await, 6);
}

#[tokio::test]
async fn test_explicit_pool_id() {
    let fixture = Fixture::new(1);
    let event_pool = pool(PoolType::Event, AccessRule::Public, None);
    fixture.store.add_pool(event_pool.clone());
    fixture.store.add_card(event_pool.id, approved_card(1), None);

    let outcome = fixture.engine
        .draw_with_rng(request(&fixture, Some(event_pool.id)), &mut FixedRoll(0.1))
        .await
        .unwrap();
    assert_eq!(outcome.pool_id, event_pool.id);
}

#[tokio::test]
async fn test_exhausted_quota_is_rejected() {
    let mut fixture = Fixture::new(0);

    let err = fixture.engine
        .draw_with_rng(request(&fixture, None), &mut FixedRoll(0.1))
        .await
        .unwrap_err();

    assert!(matches!(err, DrawError::InsufficientQuota));
    assert!(!err.is_retryable());
    assert!(fixture.store.records(fixture.user.id).is_empty());
    assert_eq!(fixture.remaining(fixture.user.id), 0);
    assert!(fixture.events.try_recv().is_err());
}

#[tokio::test]
async fn test_unknown_user() {
    let fixture = Fixture::new(1);
    let stranger = Uuid::new_v4();

    let err = fixture.engine
        .draw_with_rng(DrawRequest { user_id: stranger, pool_id: None }, &mut FixedRoll(0.1))
        .await
        .unwrap_err();
    assert!(matches!(err, DrawError::UserNotFound(id) if id == stranger));
}

#[tokio::test]
async fn test_missing_and_disabled_pools_are_not_found() {
    let fixture = Fixture::new(3);
    let missing = Uuid::new_v4();

    let err = fixture.engine
        .draw_with_rng(request(&fixture, Some(missing)), &mut FixedRoll(0.1))
        .await
        .unwrap_err();
    assert!(matches!(err, DrawError::PoolNotFound(Some(id)) if id == missing));

    let mut disabled = pool(PoolType::Event, AccessRule::Public, None);
    disabled.active = false;
    fixture.store.add_pool(disabled.clone());

    let err = fixture.engine
        .draw_with_rng(request(&fixture, Some(disabled.id)), &mut FixedRoll(0.1))
        .await
        .unwrap_err();
    assert!(matches!(err, DrawError::PoolNotFound(_)));
    assert_eq!(fixture.remaining(fixture.user.id), 3);
}

#[tokio::test]
async fn test_default_pool_skips_scheduled_standard_pool() {
    let fixture = Fixture::new(2);
    let mut next_season = pool(PoolType::Standard, AccessRule::Public, None);
    next_season.created_at = 99;
    next_season.start_time = Some(promptdraw_common::get_current_timestamp() + 86_400);
    fixture.store.add_pool(next_season.clone());
    fixture.store.add_card(next_season.id, approved_card(1), None);

    let outcome = fixture.engine
        .draw_with_rng(request(&fixture, None), &mut FixedRoll(0.1))
        .await
        .unwrap();
    assert_eq!(outcome.pool_id, fixture.standard_pool.id);
    assert_eq!(outcome.remaining_draws, 1);
}

#[tokio::test]
async fn test_default_pool_missing_when_none_in_window() {
    let fixture = Fixture::new(2);
    let mut ended = fixture.standard_pool.clone();
    ended.end_time = Some(10);
    fixture.store.add_pool(ended);

    let err = fixture.engine
        .draw_with_rng(request(&fixture, None), &mut FixedRoll(0.1))
        .await
        .unwrap_err();
    assert!(matches!(err, DrawError::PoolNotFound(None)));
    assert_eq!(fixture.remaining(fixture.user.id), 2);
}

#[tokio::test]
async fn test_pool_outside_window_is_inactive() {
    let fixture = Fixture::new(3);
    let mut upcoming = pool(PoolType::Event, AccessRule::Public, None);
    upcoming.start_time = Some(promptdraw_common::get_current_timestamp() + 3600);
    fixture.store.add_pool(upcoming.clone());
    fixture.store.add_card(upcoming.id, approved_card(1), None);

    let err = fixture.engine
        .draw_with_rng(request(&fixture, Some(upcoming.id)), &mut FixedRoll(0.1))
        .await
        .unwrap_err();
    assert!(matches!(err, DrawError::PoolInactive(id) if id == upcoming.id));
    assert_eq!(fixture.remaining(fixture.user.id), 3);
}

#[tokio::test]
async fn test_contributor_pool_requires_contributor_role() {
    let fixture = Fixture::new(3);
    let contributor_pool = pool(PoolType::Contributor, AccessRule::Public, None);
    fixture.store.add_pool(contributor_pool.clone());
    for tier_id in 1..=6 {
        fixture.store.add_card(contributor_pool.id, approved_card(tier_id), None);
    }

    let err = fixture.engine
        .draw_with_rng(request(&fixture, Some(contributor_pool.id)), &mut FixedRoll(0.1))
        .await
        .unwrap_err();
    assert!(matches!(err, DrawError::PoolAccessDenied(_)));
    assert_eq!(fixture.remaining(fixture.user.id), 3);

    let contributor = fixture.add_user(UserRole::Contributor, 1);
    let outcome = fixture.engine
        .draw_with_rng(DrawRequest { user_id: contributor.id, pool_id: Some(contributor_pool.id) }, &mut FixedRoll(0.1))
        .await
        .unwrap();
    assert_eq!(outcome.remaining_draws, 0);
}

#[tokio::test]
async fn test_empty_tier_cascades_down_never_up() {
    let fixture = Fixture::new(3);
    let sparse = pool(PoolType::Event, AccessRule::Public, None);
    fixture.store.add_pool(sparse.clone());
    for _ in 0..10 {
        fixture.store.add_card(sparse.id, approved_card(3), None);
    }
    fixture.store.add_card(sparse.id, approved_card(5), None);

    // 0.96 resolves to tier 4, which this pool does not stock
    let outcome = fixture.engine
        .draw_with_rng(request(&fixture, Some(sparse.id)), &mut FixedRoll(0.96))
        .await
        .unwrap();

    assert_eq!(outcome.card.card.rarity_tier_id, 3);
    assert_eq!(outcome.card.rarity_name, "tier-3");
    assert!(outcome.cascaded);
    assert_eq!(fixture.store.records(fixture.user.id)[0].rarity_tier_id, 3);
}

#[tokio::test]
async fn test_exhausted_cascade_rolls_back() {
    let mut fixture = Fixture::new(3);
    let top_heavy = pool(PoolType::Event, AccessRule::Public, None);
    fixture.store.add_pool(top_heavy.clone());
    fixture.store.add_card(top_heavy.id, approved_card(6), None);

    let err = fixture.engine
        .draw_with_rng(request(&fixture, Some(top_heavy.id)), &mut FixedRoll(0.2))
        .await
        .unwrap_err();

    assert!(matches!(err, DrawError::NoEligibleCard { tier_id: 1, .. }));
    assert!(!err.is_retryable());
    assert_eq!(fixture.remaining(fixture.user.id), 3);
    assert!(fixture.store.records(fixture.user.id).is_empty());
    assert!(fixture.events.try_recv().is_err());
}

#[tokio::test]
async fn test_pity_guarantee_ignores_roll() {
    let fixture = Fixture::new(3);
    fixture.store.seed_history(fixture.user.id, fixture.standard_pool.id, &[1; 30]);

    let outcome = fixture.engine
        .draw_with_rng(request(&fixture, None), &mut FixedRoll(0.0))
        .await
        .unwrap();

    assert_eq!(outcome.draw_method, DrawMethod::Guaranteed);
    assert_eq!(outcome.card.card.rarity_tier_id, 3);

    // the guaranteed rare resets the streak
    let pity = fixture.engine.pity_status(fixture.user.id).await.unwrap();
    assert_eq!(pity.draws_since_rare, 0);
    assert_eq!(pity.total_draws, 31);
    assert_eq!(pity.forced_tier_id, None);
}

#[tokio::test]
async fn test_draw_reads_only_through_its_transaction() {
    let mut env = engine_env();
    // reload the catalog on every draw
    env.rarity_cache_ttl_secs = 0;
    let fixture = Fixture::build(3, env);
    fixture.store.seed_history(fixture.user.id, fixture.standard_pool.id, &[1; 30]);

    let outcome = fixture.engine
        .draw_with_rng(request(&fixture, None), &mut FixedRoll(0.0))
        .await
        .unwrap();
    assert_eq!(outcome.draw_method, DrawMethod::Guaranteed);
    assert!(!outcome.pity_degraded);

    fixture.engine.draw_with_rng(request(&fixture, None), &mut FixedRoll(0.5)).await.unwrap();
    assert_eq!(fixture.store.reads_during_draws(), 0);
}

#[tokio::test]
async fn test_pity_status_reports_streaks() {
    let fixture = Fixture::new(3);
    fixture.store.seed_history(fixture.user.id, fixture.standard_pool.id, &[4, 1, 2, 1]);

    let pity = fixture.engine.pity_status(fixture.user.id).await.unwrap();
    assert_eq!(pity.total_draws, 4);
    assert_eq!(pity.draws_since_rare, 3);
    assert_eq!(pity.draws_since_epic, 3);
    assert_eq!(pity.draws_since_legendary, 4);
    assert!(!pity.degraded);
}

#[tokio::test]
async fn test_recent_draws_are_newest_first_and_clamped() {
    let fixture = Fixture::new(3);
    fixture.store.seed_history(fixture.user.id, fixture.standard_pool.id, &[1, 2, 3]);

    let records = fixture.engine.recent_draws(fixture.user.id, 2).await.unwrap();
    assert_eq!(records.iter().map(|r| r.rarity_tier_id).collect::<Vec<_>>(), vec![3, 2]);

    // non-positive limits still return one record
    assert_eq!(fixture.engine.recent_draws(fixture.user.id, 0).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_new_user_pool_bonus() {
    let fixture = Fixture::new(3);
    let welcome = pool(PoolType::NewUser, AccessRule::Public, None);
    fixture.store.add_pool(welcome.clone());
    for tier_id in 1..=6 {
        fixture.store.add_card(welcome.id, approved_card(tier_id), None);
    }

    // at 1.5x tier 1 shrinks to 0.454375, so 0.48 moves into tier 2
    let newcomer = fixture.engine
        .draw_with_rng(request(&fixture, Some(welcome.id)), &mut FixedRoll(0.48))
        .await
        .unwrap();
    assert_eq!(newcomer.card.card.rarity_tier_id, 2);

    // ten rares: no longer new and no pity boost either
    let veteran = fixture.add_user(UserRole::User, 3);
    fixture.store.seed_history(veteran.id, welcome.id, &[3; 10]);
    let outcome = fixture.engine
        .draw_with_rng(DrawRequest { user_id: veteran.id, pool_id: Some(welcome.id) }, &mut FixedRoll(0.48))
        .await
        .unwrap();
    assert_eq!(outcome.card.card.rarity_tier_id, 1);
}

#[tokio::test]
async fn test_active_pools_and_tiers() {
    let fixture = Fixture::new(1);
    let mut ended = pool(PoolType::Event, AccessRule::Public, None);
    ended.end_time = Some(10);
    fixture.store.add_pool(ended);

    let pools = fixture.engine.active_pools().await.unwrap();
    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].id, fixture.standard_pool.id);

    let tiers = fixture.engine.tiers().await.unwrap();
    assert_eq!(tiers.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
}
