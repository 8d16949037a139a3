pub mod fullname;
