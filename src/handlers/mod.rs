// handlers/mod.rs - Portal list-view handlers
//
// Every route here sits behind the JWT middleware. Role policy is applied
// per request: views outside the role's scope redirect to the role's default
// view, and forced scope filters are pinned before the backend is queried.
pub mod views;
