use crate::conf::Conf;
use crate::containment::{check_click, ClickCheck};
use crate::overpass::OverpassClient;
use crate::provider::GreenSpaceProvider;
use crate::rest::error::RestApiError;
use crate::rest::error::RestResult as Res;
use crate::zone::{self, GeoPoint, Zone};
use actix_web::delete;
use actix_web::get;
use actix_web::web::{self, Data, Json, Query};
use actix_web::HttpResponse;
use actix_web::Scope;
use geojson::FeatureCollection;
use serde::Deserialize;

pub type Provider = GreenSpaceProvider<OverpassClient>;

pub fn scope() -> Scope {
    web::scope("/v1/green-spaces")
        .service(get)
        .service(get_geojson)
        .service(check)
        .service(delete_cache)
}

#[get("")]
pub async fn get(provider: Data<Provider>) -> Json<Vec<Zone>> {
    Json(provider.get_zones().await)
}

#[get("/geojson")]
pub async fn get_geojson(provider: Data<Provider>) -> Json<FeatureCollection> {
    Json(zone::to_feature_collection(&provider.get_zones().await))
}

#[derive(Deserialize)]
pub struct CheckArgs {
    lat: f64,
    lon: f64,
}

#[get("/check")]
pub async fn check(
    args: Query<CheckArgs>,
    provider: Data<Provider>,
    conf: Data<Conf>,
) -> Res<ClickCheck> {
    if !(-90.0..=90.0).contains(&args.lat) || !(-180.0..=180.0).contains(&args.lon) {
        return Err(RestApiError::invalid_input(format!(
            "Coordinates out of range: {}, {}",
            args.lat, args.lon
        )));
    }
    let point = GeoPoint::new(args.lat, args.lon);
    // Nothing outside of the fetch area can match, skip loading zones
    let zones = if conf.bounds.contains(point) {
        provider.get_zones().await
    } else {
        vec![]
    };
    Ok(Json(check_click(
        point,
        &zones,
        Some(&conf.bounds),
        conf.empty_zones_policy,
    )))
}

#[delete("/cache")]
pub async fn delete_cache(provider: Data<Provider>) -> HttpResponse {
    provider.clear_cache().await;
    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod test {
    use super::Provider;
    use crate::cache::{CacheTier, CachedZones, DurableTier};
    use crate::conf::Conf;
    use crate::containment::EmptyZonesPolicy;
    use crate::db::test::pool;
    use crate::rest::error::query_error_handler;
    use crate::zone::{Bounds, Zone};
    use crate::Result;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use actix_web::web::{Data, QueryConfig};
    use actix_web::{test, App};
    use deadpool_sqlite::Pool;
    use geojson::FeatureCollection;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use time::OffsetDateTime;

    // Nothing listens on the discard port, so every fetch fails fast
    fn conf(policy: EmptyZonesPolicy) -> Result<Conf> {
        Ok(Conf {
            overpass_api_url: "http://127.0.0.1:9/api/interpreter".into(),
            bounds: Bounds::parse("-20,-20,20,20")?,
            cache_ttl: Duration::from_secs(3600),
            retries: 0,
            initial_backoff: Duration::ZERO,
            empty_zones_policy: policy,
            data_dir: std::env::temp_dir(),
            server_bind: "127.0.0.1:0".into(),
        })
    }

    fn zones() -> Vec<Zone> {
        vec![Zone::mock(
            1,
            &[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)],
        )]
    }

    async fn seeded_pool() -> Result<Arc<Pool>> {
        let pool = Arc::new(pool());
        DurableTier::new(&pool)
            .set(&CachedZones::new(zones(), OffsetDateTime::now_utc()))
            .await?;
        Ok(pool)
    }

    macro_rules! app {
        ($conf:expr, $pool:expr) => {
            test::init_service(
                App::new()
                    .app_data(Data::new(Provider::from_conf(&$conf, &$pool)))
                    .app_data(Data::new($conf))
                    .app_data(QueryConfig::default().error_handler(query_error_handler))
                    .service(super::scope()),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn get_cached_zones() -> Result<()> {
        let conf = conf(EmptyZonesPolicy::Reject)?;
        let pool = seeded_pool().await?;
        let app = app!(conf, pool);
        let req = TestRequest::get().uri("/v1/green-spaces").to_request();
        let res: Vec<Zone> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(zones(), res);
        Ok(())
    }

    #[actix_web::test]
    async fn get_geojson() -> Result<()> {
        let conf = conf(EmptyZonesPolicy::Reject)?;
        let pool = seeded_pool().await?;
        let app = app!(conf, pool);
        let req = TestRequest::get()
            .uri("/v1/green-spaces/geojson")
            .to_request();
        let res: FeatureCollection = test::call_and_read_body_json(&app, req).await;
        assert_eq!(1, res.features.len());
        Ok(())
    }

    #[actix_web::test]
    async fn check_inside_and_outside() -> Result<()> {
        let conf = conf(EmptyZonesPolicy::Reject)?;
        let pool = seeded_pool().await?;
        let app = app!(conf, pool);
        let req = TestRequest::get()
            .uri("/v1/green-spaces/check?lat=5&lon=5")
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(true, res["isInside"]);
        assert_eq!("Zone 1", res["spaceName"]);
        assert_eq!("park", res["spaceType"]);
        assert_eq!(4, res["boundary"].as_array().map(Vec::len).unwrap_or(0));
        let req = TestRequest::get()
            .uri("/v1/green-spaces/check?lat=15&lon=15")
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(json!({"isInside": false, "reason": "outside_green_space"}), res);
        let req = TestRequest::get()
            .uri("/v1/green-spaces/check?lat=50&lon=50")
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(json!({"isInside": false, "reason": "out_of_bounds"}), res);
        Ok(())
    }

    #[actix_web::test]
    async fn check_invalid_input() -> Result<()> {
        let conf = conf(EmptyZonesPolicy::Reject)?;
        let pool = seeded_pool().await?;
        let app = app!(conf, pool);
        let req = TestRequest::get()
            .uri("/v1/green-spaces/check?lat=91&lon=5")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::BAD_REQUEST, res.status());
        let req = TestRequest::get()
            .uri("/v1/green-spaces/check?lat=5")
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!("invalid_input", res["code"]);
        Ok(())
    }

    #[actix_web::test]
    async fn check_without_zones_follows_policy() -> Result<()> {
        let reject = conf(EmptyZonesPolicy::Reject)?;
        let db = Arc::new(pool());
        let app = app!(reject, db);
        let req = TestRequest::get()
            .uri("/v1/green-spaces/check?lat=5&lon=5")
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(json!({"isInside": false, "reason": "zones_unavailable"}), res);

        let accept = conf(EmptyZonesPolicy::Accept)?;
        let db = Arc::new(pool());
        let app = app!(accept, db);
        let req = TestRequest::get()
            .uri("/v1/green-spaces/check?lat=5&lon=5")
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(json!({"isInside": true, "reason": "zones_unavailable"}), res);
        Ok(())
    }

    #[actix_web::test]
    async fn delete_cache() -> Result<()> {
        let conf = conf(EmptyZonesPolicy::Reject)?;
        let pool = seeded_pool().await?;
        let app = app!(conf, pool.clone());
        let req = TestRequest::delete()
            .uri("/v1/green-spaces/cache")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::NO_CONTENT, res.status());
        assert_eq!(None, DurableTier::new(&pool).get().await?);
        // Upstream is unreachable, so nothing comes back after a clear
        let req = TestRequest::get().uri("/v1/green-spaces").to_request();
        let res: Vec<Zone> = test::call_and_read_body_json(&app, req).await;
        assert!(res.is_empty());
        Ok(())
    }
}
