use crate::errors::ApiError;
use axum::{body::Body, http::Response, response::IntoResponse};
use std::{
    env,
    fmt::{Debug, Display},
    str::FromStr,
};
use tower_http::catch_panic::ResponseForPanic;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPanicHandler;

impl ResponseForPanic for JsonPanicHandler {
    type ResponseBody = Body;

    fn response_for_panic(
        &mut self,
        err: Box<dyn std::any::Any + Send + 'static>,
    ) -> Response<Self::ResponseBody> {
        if let Some(s) = err.downcast_ref::<String>() {
            tracing::error!("Service panicked: {}", s);

            ApiError::ServicePanicked(Some(s.clone()))
        } else if let Some(s) = err.downcast_ref::<&str>() {
            tracing::error!("Service panicked: {}", s);

            ApiError::ServicePanicked(Some((*s).to_owned()))
        } else {
            tracing::error!(
                "Service panicked but `CatchPanic` was unable to downcast the panic info"
            );

            ApiError::ServicePanicked(None)
        }
        .into_response()
    }
}

#[cfg(feature = "http-cors")]
use axum::routing::Router;

#[cfg(feature = "http-cors")]
pub fn setup_app_cors(app: Router) -> Router {
    use std::time::Duration;
    use tower_http::cors::{
        AllowHeaders, AllowMethods, AllowOrigin, AllowPrivateNetwork, CorsLayer, ExposeHeaders,
        MaxAge,
    };

    let max_age = env_param("APP_CORS_MAX_AGE").unwrap_or(3600_u64);

    app.layer(
        CorsLayer::new()
            .allow_headers(AllowHeaders::any())
            .allow_methods(AllowMethods::any())
            .allow_origin(AllowOrigin::any())
            .allow_private_network(AllowPrivateNetwork::yes())
            .expose_headers(ExposeHeaders::any())
            .max_age(MaxAge::exact(Duration::from_secs(max_age))),
    )
}

#[derive(thiserror::Error)]
pub enum VarError {
    #[cfg(feature = "dotenv")]
    #[error("The dotenv file could not be found")]
    DotenvFileNotFound,

    #[error("The environment variable \"{0}\" was not provided")]
    NotProvided(&'static str),
    #[error("The environment variable \"{0}\" could not be parsed")]
    Invalid(&'static str),
}

impl Debug for VarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self, f)
    }
}

impl VarError {
    fn from_std(err: env::VarError, key: &'static str) -> Self {
        match err {
            env::VarError::NotPresent => Self::NotProvided(key),
            env::VarError::NotUnicode(_) => Self::Invalid(key),
        }
    }
}

pub fn env_param<T: FromStr>(key: &'static str) -> Result<T, VarError> {
    match env::var(key) {
        Ok(v) => T::from_str(&v).map_err(|_| VarError::Invalid(key)),
        Err(err) => Err(VarError::from_std(err, key)),
    }
}

/// Like [`env_param`], but a missing variable yields `default`. A present but
/// unparsable value is still an error.
pub fn env_param_or<T: FromStr>(key: &'static str, default: T) -> Result<T, VarError> {
    match env_param(key) {
        Err(VarError::NotProvided(_)) => Ok(default),
        res => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_env_param_missing_and_invalid() {
        env::remove_var("APP_TEST_SETUP_MISSING");
        env::set_var("APP_TEST_SETUP_INVALID", "not-a-number");
        env::set_var("APP_TEST_SETUP_VALID", "5433");

        assert!(matches!(
            env_param::<u16>("APP_TEST_SETUP_MISSING"),
            Err(VarError::NotProvided("APP_TEST_SETUP_MISSING"))
        ));
        assert!(matches!(
            env_param::<u16>("APP_TEST_SETUP_INVALID"),
            Err(VarError::Invalid("APP_TEST_SETUP_INVALID"))
        ));
        assert_eq!(env_param::<u16>("APP_TEST_SETUP_VALID").unwrap(), 5433);

        assert_eq!(env_param_or("APP_TEST_SETUP_MISSING", 5432_u16).unwrap(), 5432);
        assert!(env_param_or("APP_TEST_SETUP_INVALID", 5432_u16).is_err());
    }

    #[test]
    fn test_panic_handler_responds_with_500() {
        let mut handler = JsonPanicHandler;

        let res = handler.response_for_panic(Box::new("boom"));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let res = handler.response_for_panic(Box::new(42_u8));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
