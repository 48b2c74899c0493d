use rocket::Route;

mod auth;
mod candidates;
mod votes;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(candidates::routes());
    routes.extend(votes::routes());
    routes
}
