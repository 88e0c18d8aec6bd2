use mini_fs::{environment::Environment, shell::start_shell};

fn main() {
    let env = Environment::from_env();
    env.init_logger();
    start_shell(env);
}
