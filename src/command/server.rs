use crate::conf::Conf;
use crate::provider::GreenSpaceProvider;
use crate::rest::error::query_error_handler;
use crate::rest::v1::green_spaces;
use crate::{db, Result};
use actix_web::dev::Service;
use actix_web::web::QueryConfig;
use actix_web::{
    middleware::{Compress, NormalizePath},
    web::Data,
    App, HttpServer,
};
use futures_util::future::FutureExt;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::info;

pub async fn run(conf: Conf) -> Result<()> {
    let pool = Arc::new(db::pool(&conf)?);

    // All the workers share a single provider, so they share its cache too
    let provider = Data::new(GreenSpaceProvider::from_conf(&conf, &pool));
    let server_bind = conf.server_bind.clone();
    let conf = Data::new(conf);

    info!(server_bind, "Starting server");

    HttpServer::new(move || {
        App::new()
            .wrap_fn(|req, srv| {
                let req_method = req.method().as_str().to_string();
                let req_path = req.path().to_string();
                let req_query_string = req.query_string().to_string();
                let req_time = OffsetDateTime::now_utc();
                srv.call(req).map(move |res| {
                    if let Ok(res) = res.as_ref() {
                        let res_status = res.status().as_u16();
                        let res_time_sec = (OffsetDateTime::now_utc() - req_time).as_seconds_f64();
                        if res_time_sec > 5.0 {
                            info!(
                                req_method,
                                req_path,
                                req_query_string,
                                res_status,
                                res_time_sec,
                                "Slow request",
                            );
                        }
                    }
                    res
                })
            })
            .wrap(NormalizePath::trim())
            .wrap(Compress::default())
            .app_data(provider.clone())
            .app_data(conf.clone())
            .app_data(QueryConfig::default().error_handler(query_error_handler))
            .service(green_spaces::scope())
    })
    .bind(server_bind.as_str())?
    .run()
    .await?;

    Ok(())
}
