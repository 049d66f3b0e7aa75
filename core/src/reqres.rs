//! Typed ReqRes endpoints.
//!
//! # Design
//! `ReqresApi` borrows an `ApiClient` and adds one method per endpoint. Each
//! method sends through the generic client and then checks the status the
//! endpoint promises; anything else becomes an `ApiError`. Tests that need to
//! assert on raw statuses use the `ApiClient` directly instead.

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::transport::Transport;
use crate::types::{
    CreatedUser, Credentials, ErrorBody, NewUser, Registration, SingleUser, Token, UpdatedUser, UserPage,
};

pub struct ReqresApi<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> ReqresApi<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    pub fn list_users(&self, page: u32) -> Result<UserPage, ApiError> {
        let response = self.client.get("/users").query("page", page).send()?;
        check_status(&response, 200)?;
        response.json()
    }

    pub fn get_user(&self, id: u32) -> Result<SingleUser, ApiError> {
        let response = self.client.get(&format!("/users/{id}")).send()?;
        check_status(&response, 200)?;
        response.json()
    }

    pub fn create_user(&self, user: &NewUser) -> Result<CreatedUser, ApiError> {
        let response = self.client.post("/users").json(user).send()?;
        check_status(&response, 201)?;
        response.json()
    }

    pub fn update_user(&self, id: u32, user: &NewUser) -> Result<UpdatedUser, ApiError> {
        let response = self.client.put(&format!("/users/{id}")).json(user).send()?;
        check_status(&response, 200)?;
        response.json()
    }

    pub fn delete_user(&self, id: u32) -> Result<(), ApiError> {
        let response = self.client.delete(&format!("/users/{id}")).send()?;
        check_status(&response, 204)
    }

    pub fn login(&self, credentials: &Credentials) -> Result<Token, ApiError> {
        let response = self.client.post("/login").json(credentials).send()?;
        check_status(&response, 200)?;
        response.json()
    }

    pub fn register(&self, credentials: &Credentials) -> Result<Registration, ApiError> {
        let response = self.client.post("/register").json(credentials).send()?;
        check_status(&response, 200)?;
        response.json()
    }
}

/// Map an unexpected status to the matching `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status() == expected {
        return Ok(());
    }
    if response.status() == 404 {
        return Err(ApiError::NotFound);
    }
    if let Ok(ErrorBody { error }) = response.json::<ErrorBody>() {
        return Err(ApiError::Rejected {
            status: response.status(),
            message: error,
        });
    }
    Err(ApiError::HttpError {
        status: response.status(),
        body: response.text().to_string(),
    })
}
