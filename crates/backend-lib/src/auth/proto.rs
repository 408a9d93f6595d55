//! Wire types and client stub for the remote `auth.TokenService`.
//!
//! ```text
//! service TokenService {
//!   rpc ParseToken(TokenRequest) returns (UserData);
//!   rpc GenerateToken(UserData) returns (Tokens);
//!   rpc RefreshToken(TokenRequest) returns (Tokens);
//! }
//! ```
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

const SERVICE: &str = "auth.TokenService";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TokenRequest {
    #[prost(string, tag = "1")]
    pub token: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UserData {
    #[prost(int64, tag = "1")]
    pub id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Tokens {
    #[prost(string, tag = "1")]
    pub access_token: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub refresh_token: ::prost::alloc::string::String,
}

/// Unary client for `auth.TokenService`. Cloning shares the underlying channel.
#[derive(Debug, Clone)]
pub struct TokenServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl TokenServiceClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn parse_token(
        &mut self,
        request: tonic::Request<TokenRequest>,
    ) -> Result<tonic::Response<UserData>, tonic::Status> {
        self.unary("ParseToken", request).await
    }

    pub async fn generate_token(
        &mut self,
        request: tonic::Request<UserData>,
    ) -> Result<tonic::Response<Tokens>, tonic::Status> {
        self.unary("GenerateToken", request).await
    }

    pub async fn refresh_token(
        &mut self,
        request: tonic::Request<TokenRequest>,
    ) -> Result<tonic::Response<Tokens>, tonic::Status> {
        self.unary("RefreshToken", request).await
    }

    async fn unary<Req, Resp>(
        &mut self,
        method: &str,
        request: tonic::Request<Req>,
    ) -> Result<tonic::Response<Resp>, tonic::Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        self.inner.ready().await.map_err(|e| {
            tonic::Status::new(tonic::Code::Unavailable, format!("Service was not ready: {e}"))
        })?;
        let path = PathAndQuery::try_from(format!("/{SERVICE}/{method}"))
            .map_err(|e| tonic::Status::internal(format!("invalid method path: {e}")))?;
        let codec = tonic::codec::ProstCodec::<Req, Resp>::default();
        self.inner.unary(request, path, codec).await
    }
}
