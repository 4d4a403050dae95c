//! Route tree for the workflow API.
//!
//! Three groups: `/api/auth` for sessions, `/api/data` for patient records
//! and user management, `/api/predict` for delivery-mode predictions. All
//! routes except signup and login require a valid session cookie.

use uuid::Uuid;
use warp::{Filter, Rejection, Reply};

use lib::auth::AccountService;
use lib::RecordService;

use super::filters::{authenticated, with_accounts, with_records};
use super::{handlers_auth, handlers_patient, handlers_prediction, rejections};

pub fn routes(
    accounts: AccountService,
    records: RecordService,
) -> impl Filter<Extract = (impl Reply,), Error = std::convert::Infallible> + Clone {
    auth_routes(accounts.clone())
        .or(data_routes(accounts.clone(), records.clone()))
        .or(predict_routes(accounts, records))
        .recover(rejections::handle_rejection)
}

fn auth_routes(
    accounts: AccountService,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let signup = warp::path!("api" / "auth" / "signup")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_accounts(accounts.clone()))
        .and_then(handlers_auth::signup);

    let login = warp::path!("api" / "auth" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_accounts(accounts.clone()))
        .and_then(handlers_auth::login);

    let logout = warp::path!("api" / "auth" / "logout")
        .and(warp::post())
        .and(authenticated(accounts.clone()))
        .and(with_accounts(accounts.clone()))
        .and_then(handlers_auth::logout);

    let me = warp::path!("api" / "auth" / "me")
        .and(warp::get())
        .and(authenticated(accounts))
        .and_then(handlers_auth::me);

    signup.or(login).or(logout).or(me)
}

fn data_routes(
    accounts: AccountService,
    records: RecordService,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let create = warp::path!("api" / "data" / "patient")
        .and(warp::post())
        .and(authenticated(accounts.clone()))
        .and(warp::body::json())
        .and(with_records(records.clone()))
        .and_then(handlers_patient::create);

    let list = warp::path!("api" / "data" / "patients")
        .and(warp::get())
        .and(authenticated(accounts.clone()))
        .and(with_records(records.clone()))
        .and_then(handlers_patient::list);

    let get = warp::path!("api" / "data" / "patient" / Uuid)
        .and(warp::get())
        .and(authenticated(accounts.clone()))
        .and(with_records(records.clone()))
        .and_then(handlers_patient::get_by_id);

    let review = warp::path!("api" / "data" / "patient" / Uuid / "review")
        .and(warp::put())
        .and(authenticated(accounts.clone()))
        .and(warp::body::json())
        .and(with_records(records.clone()))
        .and_then(handlers_patient::review);

    let update = warp::path!("api" / "data" / "patient" / Uuid)
        .and(warp::put())
        .and(authenticated(accounts.clone()))
        .and(warp::body::json())
        .and(with_records(records.clone()))
        .and_then(handlers_patient::update);

    let delete = warp::path!("api" / "data" / "patient" / Uuid)
        .and(warp::delete())
        .and(authenticated(accounts.clone()))
        .and(with_records(records))
        .and_then(handlers_patient::delete);

    let list_users = warp::path!("api" / "data" / "users")
        .and(warp::get())
        .and(authenticated(accounts.clone()))
        .and(with_accounts(accounts.clone()))
        .and_then(handlers_patient::list_users);

    let delete_user = warp::path!("api" / "data" / "users" / Uuid)
        .and(warp::delete())
        .and(authenticated(accounts.clone()))
        .and(with_accounts(accounts))
        .and_then(handlers_patient::delete_user);

    create
        .or(list)
        .or(review)
        .or(get)
        .or(update)
        .or(delete)
        .or(list_users)
        .or(delete_user)
}

fn predict_routes(
    accounts: AccountService,
    records: RecordService,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "predict" / "patient" / Uuid)
        .and(warp::post())
        .and(authenticated(accounts))
        .and(with_records(records))
        .and_then(handlers_prediction::run)
}
