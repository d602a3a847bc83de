//! Sign-in flow.
//!
//! The login walks a fixed sequence of steps; each step waits a bounded time
//! for the control it needs. A missing control stops the attempt at that
//! step, which is logged and reported as `false`. Nothing is retried.

use std::fmt;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{BrowserError, LoginError};
use crate::traits::{Driver, SiteSelectors};

/// Progress through the sign-in handshake. Each state names the last step
/// that completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Start,
    EmailEntered,
    PasswordEntered,
    Submitted,
    LoggedIn,
    Failed,
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "not started",
            Self::EmailEntered => "email entered",
            Self::PasswordEntered => "password entered",
            Self::Submitted => "credentials submitted",
            Self::LoggedIn => "logged in",
            Self::Failed => "login not confirmed",
        })
    }
}

pub struct Authenticator<'a> {
    config: &'a Config,
    selectors: &'a SiteSelectors,
}

impl<'a> Authenticator<'a> {
    pub fn new(config: &'a Config, selectors: &'a SiteSelectors) -> Self {
        Self { config, selectors }
    }

    /// Sign in and land on the best-seller index. Returns whether it worked.
    pub async fn login<D: Driver + ?Sized>(&self, driver: &mut D) -> bool {
        info!("Starting login process");

        match self.run(driver).await {
            Ok(LoginState::LoggedIn) => {
                info!("Successfully logged in");
                true
            }
            Ok(state) => {
                error!("Login ended with state: {}", state);
                false
            }
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }

    async fn run<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<LoginState, LoginError> {
        let mut state = LoginState::Start;

        loop {
            state = match state {
                LoginState::Start => {
                    self.open_sign_in(driver)
                        .await
                        .map_err(at("opening the sign-in form"))?;
                    self.enter_email(driver)
                        .await
                        .map_err(at("entering the email"))?;
                    LoginState::EmailEntered
                }
                LoginState::EmailEntered => {
                    self.enter_password(driver)
                        .await
                        .map_err(at("entering the password"))?;
                    LoginState::PasswordEntered
                }
                LoginState::PasswordEntered => {
                    self.submit(driver)
                        .await
                        .map_err(at("submitting the sign-in form"))?;
                    LoginState::Submitted
                }
                LoginState::Submitted => {
                    let marker = &self.selectors.logged_in_marker;
                    match driver.wait_for(marker, self.timeout()).await {
                        Ok(()) => {
                            self.land_on_listings(driver)
                                .await
                                .map_err(at("opening the best-seller index"))?;
                            LoginState::LoggedIn
                        }
                        Err(e) => {
                            error!("Failed to verify login success: {}", e);
                            LoginState::Failed
                        }
                    }
                }
                LoginState::LoggedIn | LoginState::Failed => return Ok(state),
            };
        }
    }

    fn timeout(&self) -> Duration {
        self.config.login_timeout()
    }

    async fn settle(&self) {
        sleep(self.config.page_settle()).await;
    }

    async fn open_sign_in<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<(), BrowserError> {
        driver.goto(&self.config.base_url).await?;
        self.settle().await;

        driver.wait_for(&self.selectors.sign_in, self.timeout()).await?;
        driver.click(&self.selectors.sign_in).await?;
        self.settle().await;
        Ok(())
    }

    async fn enter_email<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<(), BrowserError> {
        driver.wait_for(&self.selectors.email_input, self.timeout()).await?;
        driver.fill(&self.selectors.email_input, &self.config.email).await?;

        driver.wait_for(&self.selectors.continue_button, self.timeout()).await?;
        driver.click(&self.selectors.continue_button).await?;
        self.settle().await;
        Ok(())
    }

    async fn enter_password<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<(), BrowserError> {
        driver.wait_for(&self.selectors.password_input, self.timeout()).await?;
        driver.fill(&self.selectors.password_input, &self.config.password).await?;
        Ok(())
    }

    async fn submit<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<(), BrowserError> {
        driver.wait_for(&self.selectors.sign_in_submit, self.timeout()).await?;
        driver.click(&self.selectors.sign_in_submit).await?;
        self.settle().await;
        Ok(())
    }

    async fn land_on_listings<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<(), BrowserError> {
        driver.goto(&self.config.bestsellers_url).await?;
        self.settle().await;
        Ok(())
    }
}

fn at(step: &'static str) -> impl FnOnce(BrowserError) -> LoginError {
    move |source| LoginError { step, source }
}
