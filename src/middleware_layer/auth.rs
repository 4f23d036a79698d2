use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

/// Identity of an authenticated instructor, established by the upstream
/// identity gateway.
#[derive(Debug, Clone)]
pub struct IssuerIdentity(pub String);

/// Identity of an authenticated student, established by the upstream
/// identity gateway.
#[derive(Debug, Clone)]
pub struct SubjectIdentity(pub String);

/// Reads the identity the gateway forwarded on the request, requiring
/// `role`. The gateway terminates the actual login exchange; this layer
/// only trusts its `x-auth-user` / `x-auth-role` headers.
fn forwarded_identity(request: &Request<Body>, role: &str) -> Option<String> {
    let user = request.headers().get("x-auth-user")?.to_str().ok()?.trim();
    let actual_role = request.headers().get("x-auth-role")?.to_str().ok()?.trim();

    if user.is_empty() || actual_role != role {
        return None;
    }
    Some(user.to_string())
}

/// A middleware that requires an authenticated instructor.
pub async fn require_issuer(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = forwarded_identity(&request, "instructor").ok_or_else(|| {
        tracing::warn!("❌ Missing or non-instructor identity");
        StatusCode::FORBIDDEN
    })?;

    tracing::debug!("✅ Instructor authenticated: {}", user);
    request.extensions_mut().insert(IssuerIdentity(user));

    Ok(next.run(request).await)
}

/// A middleware that requires an authenticated student.
pub async fn require_subject(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = forwarded_identity(&request, "student").ok_or_else(|| {
        tracing::warn!("❌ Missing or non-student identity");
        StatusCode::FORBIDDEN
    })?;

    tracing::debug!("✅ Student authenticated: {}", user);
    request.extensions_mut().insert(SubjectIdentity(user));

    Ok(next.run(request).await)
}
