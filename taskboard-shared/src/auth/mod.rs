/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing behind the `PasswordEncoder` trait
/// - [`jwt`]: JWT token generation and validation
/// - [`service`]: Email/password credential checks against the user store
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::password::{Argon2Encoder, PasswordEncoder};
/// use taskboard_shared::auth::jwt::{create_token, validate_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let encoder = Argon2Encoder::with_cost(1024, 1, 1);
/// let hash = encoder.encode("user_password")?;
/// assert!(encoder.matches("user_password", &hash)?);
///
/// let token = create_token(&Claims::new(1, "ada@example.com"), "secret-key")?;
/// assert_eq!(validate_token(&token, "secret-key")?.sub, 1);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
pub mod service;
