use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::format::only_digits;
use crate::core::{PensionData, ProductInfo, ProjectionPayload, SimulationRequest, UserDetails};
use crate::session::Session;

pub const DEFAULT_BASE_URL: &str = "https://calculadoraprev.vercel.app/api/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
    #[error("authentication response did not include a token and product")]
    MissingToken,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanQuery {
    pub cpf: String,
    pub empresa: String,
    pub matricula: String,
    pub cod_plano: String,
}

impl PlanQuery {
    pub fn new(cpf: &str, product: &ProductInfo) -> Self {
        Self {
            cpf: cpf.trim().to_string(),
            empresa: product.company_code.clone(),
            matricula: product.registration.clone(),
            cod_plano: product.plan_code.clone(),
        }
    }

    pub fn for_session(session: &Session) -> Self {
        Self::new(&session.user.cpf, &session.product)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(rename = "produto", default)]
    pub product: Option<ProductInfo>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    cpf: &'a str,
    senha: &'a str,
}

#[derive(Serialize)]
struct TokenBody<'a> {
    cpf: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub fn rejection_message(status: u16, body: &str) -> String {
    if let Some(message) = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
    {
        return message;
    }
    match status {
        401 | 403 => "CPF ou senha incorretos.".to_string(),
        400 => "CPF ou senha inválidos.".to_string(),
        s if s >= 500 => "Erro no servidor. Tente novamente mais tarde.".to_string(),
        s => format!("Requisição rejeitada (status {s})."),
    }
}

#[derive(Clone, Debug)]
pub struct CalcClient {
    http: reqwest::Client,
    base_url: String,
}

impl CalcClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(format!("pension-view/{}", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!(%url, "POST");
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message: rejection_message(status.as_u16(), &text),
            });
        }
        serde_json::from_str(&text).map_err(|e| ClientError::Decode {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }

    pub async fn login(&self, cpf: &str, password: &str) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .post_json("login", &LoginBody {
                cpf,
                senha: password,
            })
            .await?;
        Ok(())
    }

    pub async fn generate_token(&self, cpf: &str) -> Result<TokenResponse, ClientError> {
        self.post_json("generateToken", &TokenBody { cpf }).await
    }

    pub async fn enrollment(&self, query: &PlanQuery) -> Result<UserDetails, ClientError> {
        self.post_json("dados-cadastro", query).await
    }

    pub async fn pension_data(&self, query: &PlanQuery) -> Result<PensionData, ClientError> {
        self.post_json("dados-previdencia", query).await
    }

    pub async fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<ProjectionPayload, ClientError> {
        self.post_json("simular-evolucao", request).await
    }

    pub async fn sign_in(&self, cpf: &str, password: &str) -> Result<Session, ClientError> {
        let cpf = only_digits(cpf);
        self.login(&cpf, password).await?;
        let TokenResponse {
            token: Some(token),
            product: Some(product),
        } = self.generate_token(&cpf).await?
        else {
            return Err(ClientError::MissingToken);
        };
        let user = self.enrollment(&PlanQuery::new(&cpf, &product)).await?;
        info!(user_id = user.id, plan = %product.plan_name, "signed in");
        Ok(Session {
            token,
            cpf,
            product,
            user,
        })
    }
}
