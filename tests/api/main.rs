mod contact;
mod helpers;
mod subscriptions_confirm;
