use crate::{
    api::v1::{issue, ok_resp, user_err_resp, ApiError, AuthUser, JSONResp},
    auth::{Principal, Tokens},
    db::{
        users,
        users::{NewUser, UserChanges},
        DbConn,
    },
};
use bcrypt::{hash, verify, DEFAULT_COST};
use rocket::{serde::json::Json, State};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// The authenticated user as the client sees it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserBody {
    pub email: String,
    pub token: String,
    pub username: String,
    pub bio: String,
    pub image: Option<String>,
}

impl UserBody {
    fn new(principal: Principal, token: String) -> UserBody {
        UserBody {
            email: principal.email,
            token,
            username: principal.username,
            bio: principal.bio,
            image: principal.image,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserEnvelope<T> {
    pub user: T,
}

#[derive(Debug, Deserialize, Validate)]
pub struct Registration {
    #[validate(email)]
    email: String,
    #[validate(length(min = 3, max = 64))]
    username: String,
    #[validate(length(min = 8, max = 255))]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct Login {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(email)]
    email: Option<String>,
    #[validate(length(min = 3, max = 64))]
    username: Option<String>,
    #[validate(length(min = 8, max = 255))]
    password: Option<String>,
    image: Option<String>,
    bio: Option<String>,
}

#[post("/users", format = "json", data = "<body>")]
pub async fn register(
    conn: DbConn,
    tokens: &State<Tokens>,
    body: Json<UserEnvelope<Registration>>,
) -> JSONResp<UserEnvelope<UserBody>> {
    let registration = body.into_inner().user;
    registration.validate()?;

    let user = conn
        .run(move |c| -> Result<_, ApiError> {
            let password = hash(&registration.password, DEFAULT_COST)?;
            let user = users::insert(
                &NewUser {
                    email: registration.email,
                    username: registration.username,
                    password,
                },
                c,
            )?;
            Ok(user)
        })
        .await?;
    log::info!("Registered user {} ({})", user.username, user.id);

    let principal = user.principal();
    let token = issue(tokens, principal.clone()).await?;
    ok_resp(UserEnvelope {
        user: UserBody::new(principal, token),
    })
}

#[post("/users/login", format = "json", data = "<body>")]
pub async fn login(
    conn: DbConn,
    tokens: &State<Tokens>,
    body: Json<UserEnvelope<Login>>,
) -> JSONResp<UserEnvelope<UserBody>> {
    let login = body.into_inner().user;
    let user = conn
        .run(move |c| -> Result<_, ApiError> {
            let user = match users::by_email(&login.email, c) {
                Ok(user) => user,
                Err(diesel::result::Error::NotFound) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            let passwords_match = verify(&login.password, &user.password)?;
            Ok(if passwords_match { Some(user) } else { None })
        })
        .await?;
    let user = match user {
        Some(user) => user,
        None => return user_err_resp("email or password is invalid"),
    };

    let principal = user.principal();
    let token = issue(tokens, principal.clone()).await?;
    ok_resp(UserEnvelope {
        user: UserBody::new(principal, token),
    })
}

#[get("/user")]
pub fn current(auth: AuthUser) -> JSONResp<UserEnvelope<UserBody>> {
    ok_resp(UserEnvelope {
        user: UserBody::new(auth.principal, auth.token),
    })
}

/// Tokens embed a snapshot of the user, so any real change issues a new one.
#[put("/user", format = "json", data = "<body>")]
pub async fn update(
    conn: DbConn,
    tokens: &State<Tokens>,
    auth: AuthUser,
    body: Json<UserEnvelope<UserUpdate>>,
) -> JSONResp<UserEnvelope<UserBody>> {
    let update = body.into_inner().user;
    update.validate()?;

    let mut changes = UserChanges {
        email: update.email,
        username: update.username,
        password: None,
        image: update.image,
        bio: update.bio,
    };
    if changes.is_empty() && update.password.is_none() {
        return current(auth);
    }

    let id = auth.id();
    let user = conn
        .run(move |c| -> Result<_, ApiError> {
            if let Some(password) = update.password {
                changes.password = Some(hash(&password, DEFAULT_COST)?);
            }
            Ok(users::update(id, &changes, c)?)
        })
        .await?;

    let principal = user.principal();
    let token = issue(tokens, principal.clone()).await?;
    ok_resp(UserEnvelope {
        user: UserBody::new(principal, token),
    })
}
